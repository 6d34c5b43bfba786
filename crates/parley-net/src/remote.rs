use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use parley_shared::{Conversation, GroupId, MessageId, SessionContext, User, UserId};

use crate::error::Result;

/// A message as returned by a history fetch, before it is attached to a
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub text: String,
    pub timestamp: i64,
    pub edited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    User(UserId),
    Group(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub text: String,
    pub recipient: Recipient,
}

/// What the remote store reported about a created message. Either field may
/// be missing when the server only acknowledges success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedMessage {
    pub id: Option<MessageId>,
    pub timestamp: Option<i64>,
}

/// Logical operations of the remote message store.
///
/// Every call carries the session so implementations can attach its bearer
/// credential; a session without one fails with
/// [`RemoteError::MissingCredential`](crate::RemoteError::MissingCredential).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Conversation summaries of the session's user.
    async fn list_conversations(&self, session: &SessionContext) -> Result<Vec<Conversation>>;

    /// Full history between the session's user and `peer`.
    async fn fetch_private_messages(
        &self,
        session: &SessionContext,
        peer: UserId,
    ) -> Result<Vec<RemoteMessage>>;

    async fn fetch_group_messages(
        &self,
        session: &SessionContext,
        group: GroupId,
    ) -> Result<Vec<RemoteMessage>>;

    async fn resolve_user(&self, session: &SessionContext, user: UserId) -> Result<User>;

    async fn create_message(
        &self,
        session: &SessionContext,
        message: &NewMessage,
    ) -> Result<CreatedMessage>;

    async fn edit_message(&self, session: &SessionContext, id: MessageId, text: &str)
        -> Result<()>;

    async fn delete_message(&self, session: &SessionContext, id: MessageId) -> Result<()>;
}
