//! Top-level synchronization engine.
//!
//! The [`SyncEngine`] owns the conversation directory, the sender directory
//! and at most one active [`ChatRoom`]. Every UI-driven mutation goes to the
//! active room; switching conversations replaces it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use parley_net::RemoteStore;
use parley_shared::{
    Conversation, ConversationKey, CorrelationId, Message, MessageId, Result, SessionContext,
    SyncError,
};

use crate::chat::{ChatRoom, SendReceipt};
use crate::config::ClientConfig;
use crate::conversations::{ConversationDirectory, Selection};
use crate::events::{EventSink, SyncEvent};
use crate::senders::SenderDirectory;

struct Inner {
    session: Arc<SessionContext>,
    remote: Arc<dyn RemoteStore>,
    senders: SenderDirectory,
    directory: ConversationDirectory,
    active: Mutex<Option<ChatRoom>>,
    events: EventSink,
    config: ClientConfig,
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl SyncEngine {
    pub fn new(
        session: SessionContext,
        remote: Arc<dyn RemoteStore>,
        config: ClientConfig,
    ) -> Self {
        let session = Arc::new(session);
        let senders = SenderDirectory::new(remote.clone(), session.clone());
        let directory =
            ConversationDirectory::new(remote.clone(), session.clone(), config.request_timeout());
        let events = EventSink::new(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                session,
                remote,
                senders,
                directory,
                active: Mutex::new(None),
                events,
                config,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn directory(&self) -> &ConversationDirectory {
        &self.inner.directory
    }

    pub fn senders(&self) -> &SenderDirectory {
        &self.inner.senders
    }

    fn active_slot(&self) -> MutexGuard<'_, Option<ChatRoom>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    pub async fn load_conversations(&self) -> Result<Vec<Conversation>> {
        match self.inner.directory.load().await {
            Ok(conversations) => {
                self.inner.events.emit(SyncEvent::ConversationsLoaded {
                    count: conversations.len(),
                });
                Ok(conversations)
            }
            Err(e) => {
                self.inner.events.emit(SyncEvent::ConversationsFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner.directory.conversations()
    }

    /// The open conversation, if any.
    pub fn active(&self) -> Option<ChatRoom> {
        self.active_slot().clone()
    }

    /// Toggle `key` in the conversation directory.
    ///
    /// Opening loads the conversation's messages and returns its room; the
    /// room stays active even when that load fails, with an empty sequence.
    /// Selecting the open conversation closes it and returns `None`.
    pub async fn select(&self, key: ConversationKey) -> Result<Option<ChatRoom>> {
        match self.inner.directory.select(key)? {
            Selection::Opened(key) => self.activate(key).await.map(Some),
            Selection::Closed(key) => {
                self.active_slot().take();
                info!(conversation = %key, "Conversation closed");
                self.inner
                    .events
                    .emit(SyncEvent::ConversationClosed { key });
                Ok(None)
            }
        }
    }

    /// Open `key` without toggling. An already open room is reused as is.
    pub async fn open(&self, key: ConversationKey) -> Result<ChatRoom> {
        if let Some(room) = self.active().filter(|room| room.key() == key) {
            debug!(conversation = %key, "Conversation already open");
            return Ok(room);
        }
        self.inner.directory.open(key)?;
        self.activate(key).await
    }

    /// Close the open conversation, if any.
    pub fn close(&self) -> Option<ConversationKey> {
        self.inner.directory.close();
        let key = self.active_slot().take().map(|room| room.key())?;
        self.inner
            .events
            .emit(SyncEvent::ConversationClosed { key });
        Some(key)
    }

    async fn activate(&self, key: ConversationKey) -> Result<ChatRoom> {
        let conversation = self
            .inner
            .directory
            .get(key)
            .ok_or_else(|| SyncError::Validation(format!("unknown conversation {key}")))?;
        let room = ChatRoom::new(
            conversation,
            self.inner.remote.clone(),
            self.inner.session.clone(),
            self.inner.senders.clone(),
            self.inner.events.clone(),
            self.inner.config.request_timeout(),
        );
        *self.active_slot() = Some(room.clone());
        info!(conversation = %key, "Conversation opened");
        self.inner
            .events
            .emit(SyncEvent::ConversationOpened { key });

        room.load().await?;
        Ok(room)
    }

    /// Reload the open conversation's history.
    pub async fn refresh(&self) -> Result<usize> {
        self.require_active()?.load().await
    }

    // -----------------------------------------------------------------------
    // Mutations on the open conversation
    // -----------------------------------------------------------------------

    fn require_active(&self) -> Result<ChatRoom> {
        self.active().ok_or(SyncError::NoActiveConversation)
    }

    pub async fn send(&self, text: &str) -> Result<SendReceipt> {
        let room = self.require_active()?;
        let receipt = room.send(text).await?;
        self.note_sent(&room, text, &receipt);
        Ok(receipt)
    }

    pub async fn edit(&self, id: MessageId, new_text: &str) -> Result<()> {
        self.require_active()?.edit(id, new_text).await
    }

    pub async fn delete(&self, id: MessageId) -> Result<()> {
        self.require_active()?.delete(id).await
    }

    pub async fn retry(&self, correlation_id: CorrelationId) -> Result<SendReceipt> {
        let room = self.require_active()?;
        let text = room
            .messages()
            .into_iter()
            .find(|m| m.correlation_id == Some(correlation_id))
            .map(|m| m.text);
        let receipt = room.retry(correlation_id).await?;
        if let Some(text) = text {
            self.note_sent(&room, &text, &receipt);
        }
        Ok(receipt)
    }

    pub fn discard(&self, correlation_id: CorrelationId) -> Result<Message> {
        self.require_active()?.discard(correlation_id)
    }

    fn note_sent(&self, room: &ChatRoom, text: &str, receipt: &SendReceipt) {
        if !self
            .inner
            .directory
            .record_activity(room.key(), text, receipt.timestamp, true)
        {
            warn!(conversation = %room.key(), "Sent to a conversation missing from the list");
        }
    }

    // -----------------------------------------------------------------------
    // Presentation helpers
    // -----------------------------------------------------------------------

    /// Messages of the open conversation, empty when none is open.
    pub fn messages(&self) -> Vec<Message> {
        self.active().map(|room| room.messages()).unwrap_or_default()
    }

    pub fn format_display_time(&self, message: &Message) -> String {
        parley_store::format_display_time(message, &self.inner.config.display_offset())
    }
}
