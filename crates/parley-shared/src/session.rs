//! Explicit identity of the signed-in user.
//!
//! A [`SessionContext`] is built once by whoever owns sign-in and handed by
//! `Arc` to every component that needs the current user id or credential.

use std::fmt;

use crate::types::UserId;

/// Bearer token. Its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    user_id: UserId,
    credential: Credential,
}

impl SessionContext {
    pub fn new(user_id: UserId, credential: Credential) -> Self {
        Self {
            user_id,
            credential,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The bearer token, or `None` when the session has no usable credential.
    pub fn bearer(&self) -> Option<&str> {
        if self.credential.is_empty() {
            None
        } else {
            Some(self.credential.expose())
        }
    }
}
