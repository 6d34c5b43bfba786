use parley_shared::{GroupId, MessageId, UserId};

use crate::error::{RemoteError, Result};

pub fn validated_base(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(RemoteError::InvalidBaseUrl);
    }
    if trimmed.len() < 8 {
        return Err(RemoteError::InvalidBaseUrl);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub fn conversations(base: &str, user: UserId) -> String {
    format!("{base}/api/v1/messages/conversations/{user}")
}

pub fn private_messages(base: &str, user_a: UserId, user_b: UserId) -> String {
    format!("{base}/api/v1/messages/conversation?userId1={user_a}&userId2={user_b}")
}

pub fn group_messages(base: &str, group: GroupId) -> String {
    format!("{base}/api/v1/messages/group/{group}")
}

pub fn user(base: &str, user: UserId) -> String {
    format!("{base}/api/v1/users/{user}")
}

pub fn messages(base: &str) -> String {
    format!("{base}/api/v1/messages")
}

pub fn message(base: &str, id: MessageId) -> String {
    format!("{base}/api/v1/messages/{id}")
}
