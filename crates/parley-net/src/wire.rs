//! JSON shapes exchanged with the REST API and their validation.
//!
//! Bodies are first parsed into `serde_json::Value` so that a shape mismatch
//! (an object where an array was expected, a missing field) is reported as
//! [`RemoteError::Schema`] with the offending position.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use parley_shared::{Conversation, ConversationKind, GroupId, MessageId, User, UserId};

use crate::error::{RemoteError, Result};
use crate::remote::{CreatedMessage, NewMessage, Recipient, RemoteMessage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub friend_id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub group_id: Option<i64>,
    pub group_name: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_timestamp: i64,
    #[serde(default)]
    pub sent: bool,
}

impl ConversationDto {
    pub fn into_conversation(self) -> std::result::Result<Conversation, String> {
        let kind = match (self.friend_id, self.group_id) {
            (Some(peer), None) => ConversationKind::Private {
                peer_user_id: UserId(peer),
                peer_first_name: self.first_name,
                peer_last_name: self.last_name,
            },
            (None, Some(group)) => ConversationKind::Group {
                group_id: GroupId(group),
                group_name: self
                    .group_name
                    .ok_or_else(|| "group conversation without groupName".to_string())?,
            },
            (Some(_), Some(_)) => return Err("both friendId and groupId present".into()),
            (None, None) => return Err("neither friendId nor groupId present".into()),
        };
        Ok(Conversation {
            kind,
            last_message_preview: self.last_message,
            last_message_timestamp: self.last_message_timestamp,
            sent_by_me: self.sent,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub sender_id: i64,
    pub text: String,
    pub timestamp: i64,
    #[serde(default)]
    pub edited: bool,
}

impl From<MessageDto> for RemoteMessage {
    fn from(m: MessageDto) -> Self {
        Self {
            id: MessageId(m.id),
            sender_id: UserId(m.sender_id),
            text: m.text,
            timestamp: m.timestamp,
            edited: m.edited,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatedMessageDto {
    pub id: Option<i64>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageBody<'a> {
    pub text: &'a str,
    pub sender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
}

impl<'a> From<&'a NewMessage> for CreateMessageBody<'a> {
    fn from(m: &'a NewMessage) -> Self {
        let (recipient_id, group_id) = match m.recipient {
            Recipient::User(user) => (Some(user.0), None),
            Recipient::Group(group) => (None, Some(group.0)),
        };
        Self {
            text: &m.text,
            sender_id: m.sender_id.0,
            recipient_id,
            group_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditMessageBody<'a> {
    pub text: &'a str,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a body that must be a JSON array of `T`.
pub fn decode_array<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>> {
    let value: Value = serde_json::from_slice(body)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(RemoteError::Schema(format!(
                "expected an array, got {}",
                kind_of(&other)
            )))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| RemoteError::Schema(format!("element {i}: {e}")))
        })
        .collect()
}

pub fn decode_conversations(body: &[u8]) -> Result<Vec<Conversation>> {
    decode_array::<ConversationDto>(body)?
        .into_iter()
        .enumerate()
        .map(|(i, dto)| {
            dto.into_conversation()
                .map_err(|e| RemoteError::Schema(format!("element {i}: {e}")))
        })
        .collect()
}

pub fn decode_messages(body: &[u8]) -> Result<Vec<RemoteMessage>> {
    Ok(decode_array::<MessageDto>(body)?
        .into_iter()
        .map(RemoteMessage::from)
        .collect())
}

pub fn decode_user(body: &[u8], requested: UserId) -> Result<User> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(RemoteError::Schema(format!(
            "expected a user object, got {}",
            kind_of(&value)
        )));
    }
    let dto: UserDto =
        serde_json::from_value(value).map_err(|e| RemoteError::Schema(e.to_string()))?;
    if dto.id != requested.0 {
        return Err(RemoteError::Schema(format!(
            "asked for user {requested}, got {}",
            dto.id
        )));
    }
    Ok(User {
        id: UserId(dto.id),
        first_name: dto.first_name,
        last_name: dto.last_name,
    })
}

/// An empty body is a bare acknowledgement.
pub fn decode_created(body: &[u8]) -> Result<CreatedMessage> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreatedMessage::default());
    }
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(RemoteError::Schema(format!(
            "expected a message object, got {}",
            kind_of(&value)
        )));
    }
    let dto: CreatedMessageDto =
        serde_json::from_value(value).map_err(|e| RemoteError::Schema(e.to_string()))?;
    Ok(CreatedMessage {
        id: dto.id.map(MessageId),
        timestamp: dto.timestamp,
    })
}
