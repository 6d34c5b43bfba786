use tokio::sync::broadcast;

use parley_shared::{ConversationKey, CorrelationId};
use parley_store::ScrollAnchor;

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    ConversationsLoaded {
        count: usize,
    },
    ConversationsFailed {
        reason: String,
    },
    ConversationOpened {
        key: ConversationKey,
    },
    ConversationClosed {
        key: ConversationKey,
    },
    /// The message sequence changed; the view should follow `anchor`.
    MessagesChanged {
        key: ConversationKey,
        len: usize,
        anchor: Option<ScrollAnchor>,
    },
    SendFailed {
        key: ConversationKey,
        correlation_id: CorrelationId,
        reason: String,
    },
}

/// Broadcast half shared by the engine and its chat rooms.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No event subscribers");
        }
    }
}
