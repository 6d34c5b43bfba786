use std::time::Duration;

use parley_shared::SyncError;
use thiserror::Error;

/// Errors produced while talking to the remote store.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed but did not have the expected shape.
    #[error("Malformed response: {0}")]
    Schema(String),

    #[error("Not found")]
    NotFound,

    #[error("Credential rejected")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Session has no credential")]
    MissingCredential,

    #[error("Invalid base URL")]
    InvalidBaseUrl,

    #[error("Response too large")]
    ResponseTooLarge,

    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
}

/// The core operation a remote failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Create,
    Edit,
    Delete,
}

impl RemoteError {
    /// Map into the error reported to the presentation layer, keeping
    /// `context` (e.g. the conversation or message) in the message.
    pub fn into_sync(self, op: Operation, context: &str) -> SyncError {
        match self {
            Self::MissingCredential | Self::Unauthorized => {
                SyncError::Unauthenticated(format!("{context}: {self}"))
            }
            Self::Forbidden => SyncError::RemotePermission(context.to_string()),
            other => op.failed(format!("{context}: {other}")),
        }
    }
}

impl Operation {
    /// The error reported when the call did not finish within `after`.
    pub fn timed_out(self, context: &str, after: Duration) -> SyncError {
        self.failed(format!("{context}: timed out after {}ms", after.as_millis()))
    }

    fn failed(self, reason: String) -> SyncError {
        match self {
            Self::Fetch => SyncError::Fetch(reason),
            Self::Create => SyncError::Create(reason),
            Self::Edit => SyncError::Edit(reason),
            Self::Delete => SyncError::Delete(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_by_operation() {
        let err = RemoteError::Status(500).into_sync(Operation::Delete, "message 7");
        assert_eq!(err, SyncError::Delete("message 7: Unexpected status 500".into()));

        let err = RemoteError::Schema("expected array".into()).into_sync(Operation::Fetch, "dm");
        assert!(matches!(err, SyncError::Fetch(_)));
    }

    #[test]
    fn credential_failures_are_unauthenticated() {
        let err = RemoteError::MissingCredential.into_sync(Operation::Create, "send");
        assert!(matches!(err, SyncError::Unauthenticated(_)));
        let err = RemoteError::Unauthorized.into_sync(Operation::Fetch, "list");
        assert!(matches!(err, SyncError::Unauthenticated(_)));
    }

    #[test]
    fn timeout_names_the_operation() {
        let err = Operation::Create.timed_out("send to dm:1:2", Duration::from_millis(50));
        assert_eq!(err, SyncError::Create("send to dm:1:2: timed out after 50ms".into()));
    }

    #[test]
    fn forbidden_is_permission() {
        let err = RemoteError::Forbidden.into_sync(Operation::Edit, "message 3");
        assert!(err.is_permission());
    }
}
