use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

use parley_shared::{Conversation, GroupId, MessageId, SessionContext, User, UserId};

use crate::config::RemoteConfig;
use crate::error::{RemoteError, Result};
use crate::remote::{CreatedMessage, NewMessage, RemoteMessage, RemoteStore};
use crate::urls;
use crate::wire::{self, CreateMessageBody, EditMessageBody};

/// [`RemoteStore`] over the REST API.
pub struct HttpRemoteStore {
    base_url: String,
    http: reqwest::Client,
    cfg: RemoteConfig,
}

impl HttpRemoteStore {
    pub fn new(cfg: RemoteConfig) -> Result<Self> {
        if cfg.timeout_ms == 0 {
            return Err(RemoteError::InvalidInput("timeout_ms"));
        }
        if cfg.connect_timeout_ms == 0 {
            return Err(RemoteError::InvalidInput("connect_timeout_ms"));
        }
        if cfg.max_response_bytes == 0 {
            return Err(RemoteError::InvalidInput("max_response_bytes"));
        }
        if cfg.user_agent.trim().is_empty() {
            return Err(RemoteError::InvalidInput("user_agent"));
        }
        let base_url = urls::validated_base(&cfg.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .build()?;
        Ok(Self {
            base_url,
            http,
            cfg,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach the bearer credential, send, and return the checked body.
    async fn execute(&self, session: &SessionContext, req: RequestBuilder) -> Result<Vec<u8>> {
        let token = session.bearer().ok_or(RemoteError::MissingCredential)?;
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();
        debug!(status = status.as_u16(), url = %resp.url(), "Remote store replied");
        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(RemoteError::Unauthorized),
            StatusCode::FORBIDDEN => return Err(RemoteError::Forbidden),
            StatusCode::NOT_FOUND => return Err(RemoteError::NotFound),
            other => return Err(RemoteError::Status(other.as_u16())),
        }
        let body = resp.bytes().await?;
        if body.len() > self.cfg.max_response_bytes {
            return Err(RemoteError::ResponseTooLarge);
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_conversations(&self, session: &SessionContext) -> Result<Vec<Conversation>> {
        let url = urls::conversations(&self.base_url, session.user_id());
        let body = self.execute(session, self.http.get(url)).await?;
        wire::decode_conversations(&body)
    }

    async fn fetch_private_messages(
        &self,
        session: &SessionContext,
        peer: UserId,
    ) -> Result<Vec<RemoteMessage>> {
        let url = urls::private_messages(&self.base_url, session.user_id(), peer);
        let body = self.execute(session, self.http.get(url)).await?;
        wire::decode_messages(&body)
    }

    async fn fetch_group_messages(
        &self,
        session: &SessionContext,
        group: GroupId,
    ) -> Result<Vec<RemoteMessage>> {
        let url = urls::group_messages(&self.base_url, group);
        let body = self.execute(session, self.http.get(url)).await?;
        wire::decode_messages(&body)
    }

    async fn resolve_user(&self, session: &SessionContext, user: UserId) -> Result<User> {
        let url = urls::user(&self.base_url, user);
        let body = self.execute(session, self.http.get(url)).await?;
        wire::decode_user(&body, user)
    }

    async fn create_message(
        &self,
        session: &SessionContext,
        message: &NewMessage,
    ) -> Result<CreatedMessage> {
        let url = urls::messages(&self.base_url);
        let req = self.http.post(url).json(&CreateMessageBody::from(message));
        let body = self.execute(session, req).await?;
        wire::decode_created(&body)
    }

    async fn edit_message(
        &self,
        session: &SessionContext,
        id: MessageId,
        text: &str,
    ) -> Result<()> {
        let url = urls::message(&self.base_url, id);
        let req = self.http.put(url).json(&EditMessageBody { text });
        self.execute(session, req).await?;
        Ok(())
    }

    async fn delete_message(&self, session: &SessionContext, id: MessageId) -> Result<()> {
        let url = urls::message(&self.base_url, id);
        self.execute(session, self.http.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use parley_shared::Credential;

    use super::*;
    use crate::remote::Recipient;

    const TOKEN: &str = "t0k3n";

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {TOKEN}"))
            .unwrap_or(false)
    }

    async fn conversations(headers: HeaderMap, Path(user): Path<i64>) -> Response {
        if !authorized(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        Json(json!([
            {"friendId": 2, "firstName": "Bea", "lastName": "Ng",
             "lastMessage": format!("to {user}"), "lastMessageTimestamp": 1000, "sent": false}
        ]))
        .into_response()
    }

    async fn private_history(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if !authorized(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        let from: i64 = params.get("userId1").and_then(|v| v.parse().ok()).unwrap_or(0);
        Json(json!([
            {"id": 1, "senderId": from, "text": "hello", "timestamp": 10},
            {"id": 2, "senderId": 2, "text": "back", "timestamp": 20, "edited": true}
        ]))
        .into_response()
    }

    async fn group_history() -> Json<Value> {
        Json(json!({"error": "not an array"}))
    }

    async fn user(Path(id): Path<i64>) -> Response {
        if id == 5 {
            Json(json!({"id": 5, "firstName": "Eve", "lastName": "Moss"})).into_response()
        } else {
            AxumStatus::NOT_FOUND.into_response()
        }
    }

    async fn create(headers: HeaderMap, Json(body): Json<Value>) -> Response {
        if !authorized(&headers) || body.get("recipientId") != Some(&json!(2)) {
            return AxumStatus::BAD_REQUEST.into_response();
        }
        Json(json!({"id": 101, "timestamp": 1000})).into_response()
    }

    async fn edit(Path(id): Path<i64>) -> AxumStatus {
        if id == 13 {
            AxumStatus::FORBIDDEN
        } else {
            AxumStatus::OK
        }
    }

    async fn delete(Path(_id): Path<i64>) -> AxumStatus {
        AxumStatus::NO_CONTENT
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/api/v1/messages/conversations/:user", get(conversations))
            .route("/api/v1/messages/conversation", get(private_history))
            .route("/api/v1/messages/group/:group", get(group_history))
            .route("/api/v1/users/:id", get(user))
            .route("/api/v1/messages", post(create))
            .route("/api/v1/messages/:id", put(edit).delete(delete));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: &str) -> HttpRemoteStore {
        let cfg = RemoteConfig {
            base_url: base_url.to_string(),
            ..RemoteConfig::default()
        };
        HttpRemoteStore::new(cfg).expect("client")
    }

    fn session(token: &str) -> SessionContext {
        SessionContext::new(UserId(1), Credential::new(token))
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let cfg = RemoteConfig {
            base_url: "ftp://nowhere".into(),
            ..RemoteConfig::default()
        };
        assert!(matches!(
            HttpRemoteStore::new(cfg),
            Err(RemoteError::InvalidBaseUrl)
        ));
        let cfg = RemoteConfig {
            timeout_ms: 0,
            ..RemoteConfig::default()
        };
        assert!(matches!(
            HttpRemoteStore::new(cfg),
            Err(RemoteError::InvalidInput("timeout_ms"))
        ));
    }

    #[tokio::test]
    async fn lists_conversations_with_bearer() {
        let base = spawn_server().await;
        let client = client_for(&base);
        let list = client.list_conversations(&session(TOKEN)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].last_message_preview, "to 1");

        let err = client.list_conversations(&session("wrong")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized));
    }

    #[tokio::test]
    async fn missing_credential_fails_before_request() {
        let client = client_for("http://127.0.0.1:9");
        let err = client.list_conversations(&session("")).await.unwrap_err();
        assert!(matches!(err, RemoteError::MissingCredential));
    }

    #[tokio::test]
    async fn fetches_private_history() {
        let base = spawn_server().await;
        let client = client_for(&base);
        let history = client
            .fetch_private_messages(&session(TOKEN), UserId(2))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender_id, UserId(1));
        assert!(history[1].edited);
    }

    #[tokio::test]
    async fn non_array_history_is_schema_error() {
        let base = spawn_server().await;
        let client = client_for(&base);
        let err = client
            .fetch_group_messages(&session(TOKEN), GroupId(3))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Schema(_)));
    }

    #[tokio::test]
    async fn resolves_users_and_reports_not_found() {
        let base = spawn_server().await;
        let client = client_for(&base);
        let eve = client.resolve_user(&session(TOKEN), UserId(5)).await.unwrap();
        assert_eq!(eve.first_name, "Eve");
        let err = client
            .resolve_user(&session(TOKEN), UserId(6))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound));
    }

    #[tokio::test]
    async fn creates_edits_and_deletes() {
        let base = spawn_server().await;
        let client = client_for(&base);
        let s = session(TOKEN);

        let created = client
            .create_message(
                &s,
                &NewMessage {
                    sender_id: UserId(1),
                    text: "hi".into(),
                    recipient: Recipient::User(UserId(2)),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, Some(MessageId(101)));
        assert_eq!(created.timestamp, Some(1000));

        client.edit_message(&s, MessageId(101), "hey").await.unwrap();
        let err = client
            .edit_message(&s, MessageId(13), "hey")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Forbidden));

        client.delete_message(&s, MessageId(101)).await.unwrap();
    }
}
