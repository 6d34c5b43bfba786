use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SENT_BY_ME_PREFIX;

// User identity as assigned by the remote store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-generated tag tying an optimistic entry to its own in-flight request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Identity of a conversation.
///
/// A private conversation is keyed by the unordered pair of its participants,
/// so `private(a, b) == private(b, a)`. A group conversation is keyed by its
/// group id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationKey {
    Private { low: UserId, high: UserId },
    Group(GroupId),
}

impl ConversationKey {
    pub fn private(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self::Private { low: a, high: b }
        } else {
            Self::Private { low: b, high: a }
        }
    }

    pub fn group(group_id: GroupId) -> Self {
        Self::Group(group_id)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private { low, high } => write!(f, "dm:{low}:{high}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConversationKind {
    Private {
        peer_user_id: UserId,
        peer_first_name: String,
        peer_last_name: String,
    },
    Group {
        group_id: GroupId,
        group_name: String,
    },
}

/// Read-only summary of a conversation as listed by the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub kind: ConversationKind,
    pub last_message_preview: String,
    /// Epoch milliseconds.
    pub last_message_timestamp: i64,
    pub sent_by_me: bool,
}

impl Conversation {
    pub fn key(&self, current_user: UserId) -> ConversationKey {
        match &self.kind {
            ConversationKind::Private { peer_user_id, .. } => {
                ConversationKey::private(current_user, *peer_user_id)
            }
            ConversationKind::Group { group_id, .. } => ConversationKey::group(*group_id),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ConversationKind::Group { .. })
    }

    /// Name shown in the conversation list and the chat header.
    pub fn title(&self) -> String {
        match &self.kind {
            ConversationKind::Private {
                peer_user_id,
                peer_first_name,
                peer_last_name,
            } => {
                let name = format!("{peer_first_name} {peer_last_name}");
                let name = name.trim();
                if name.is_empty() {
                    peer_user_id.to_string()
                } else {
                    name.to_string()
                }
            }
            ConversationKind::Group { group_name, .. } => group_name.clone(),
        }
    }

    pub fn preview_line(&self) -> String {
        if self.sent_by_me {
            format!("{SENT_BY_ME_PREFIX}{}", self.last_message_preview)
        } else {
            self.last_message_preview.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Absent until the remote store confirms the message.
    pub id: Option<MessageId>,
    /// Present on entries created by a local send.
    pub correlation_id: Option<CorrelationId>,
    pub conversation_key: ConversationKey,
    pub sender_id: UserId,
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub edited: bool,
    /// Only populated in group conversations.
    pub sender_display_name: Option<String>,
    pub sync_state: SyncState,
    /// Why a send failed, kept so the failure stays visible.
    pub failure: Option<String>,
}

impl Message {
    /// A message as fetched from the remote store.
    pub fn confirmed(
        id: MessageId,
        conversation_key: ConversationKey,
        sender_id: UserId,
        text: impl Into<String>,
        timestamp: i64,
        edited: bool,
    ) -> Self {
        Self {
            id: Some(id),
            correlation_id: None,
            conversation_key,
            sender_id,
            text: text.into(),
            timestamp,
            edited,
            sender_display_name: None,
            sync_state: SyncState::Confirmed,
            failure: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.sync_state == SyncState::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.sync_state == SyncState::Failed
    }
}
