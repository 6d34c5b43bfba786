use thiserror::Error;

use crate::types::{MessageId, UserId};

/// Errors surfaced to the presentation layer.
///
/// None of them is retried automatically. Remote failures carry the failed
/// operation's context in their message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Rejected before any network call (empty text, unknown id).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The current user does not own the message.
    #[error("Permission denied: user {user} cannot modify message {message}")]
    Permission { user: UserId, message: MessageId },

    /// The remote store rejected the mutation as not permitted.
    #[error("Permission denied by remote store: {0}")]
    RemotePermission(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Create failed: {0}")]
    Create(String),

    #[error("Edit failed: {0}")]
    Edit(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    /// Sender resolution failed; callers fall back to the raw id.
    #[error("Lookup failed for user {user}: {reason}")]
    Lookup { user: UserId, reason: String },

    /// No valid credential in the session.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("No conversation is open")]
    NoActiveConversation,
}

impl SyncError {
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission { .. } | Self::RemotePermission(_))
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SyncError>;
