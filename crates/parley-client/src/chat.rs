//! Driver for the open conversation's [`MessageStore`].
//!
//! Sends are optimistic: the entry is appended before the remote call and
//! reconciled by its correlation id when the call returns. Edits and deletes
//! touch the store only after the remote store confirms them. Every remote
//! call is bounded by the configured request timeout.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use parley_net::{NewMessage, Operation, Recipient, RemoteError, RemoteMessage, RemoteStore};
use parley_shared::time::now_ms;
use parley_shared::{
    Conversation, ConversationKey, ConversationKind, CorrelationId, Message, MessageId, Result,
    SessionContext, SyncError, UserId,
};
use parley_store::{validate_text, MessageStore, ScrollAnchor};

use crate::events::{EventSink, SyncEvent};
use crate::senders::SenderDirectory;

/// Result of a confirmed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReceipt {
    pub correlation_id: CorrelationId,
    pub id: Option<MessageId>,
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct ChatRoom {
    conversation: Conversation,
    key: ConversationKey,
    store: Arc<Mutex<MessageStore>>,
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
    senders: SenderDirectory,
    events: EventSink,
    request_timeout: Duration,
}

impl ChatRoom {
    pub fn new(
        conversation: Conversation,
        remote: Arc<dyn RemoteStore>,
        session: Arc<SessionContext>,
        senders: SenderDirectory,
        events: EventSink,
        request_timeout: Duration,
    ) -> Self {
        let key = conversation.key(session.user_id());
        Self {
            store: Arc::new(Mutex::new(MessageStore::new(key, session.user_id()))),
            conversation,
            key,
            remote,
            session,
            senders,
            events,
            request_timeout,
        }
    }

    pub fn key(&self) -> ConversationKey {
        self.key
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Snapshot of the message sequence.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages().to_vec()
    }

    pub fn scroll_anchor(&self) -> Option<ScrollAnchor> {
        self.lock().scroll_anchor()
    }

    fn lock(&self) -> MutexGuard<'_, MessageStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn me(&self) -> UserId {
        self.session.user_id()
    }

    fn changed(&self, store: &MessageStore) {
        self.events.emit(SyncEvent::MessagesChanged {
            key: self.key,
            len: store.len(),
            anchor: store.scroll_anchor(),
        });
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, RemoteError>>,
        op: Operation,
        context: &str,
    ) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.into_sync(op, context)),
            Err(_) => Err(op.timed_out(context, self.request_timeout)),
        }
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Fetch the full history. On failure the store is emptied (pending and
    /// failed sends excepted) and a fetch error is returned.
    pub async fn load(&self) -> Result<usize> {
        let generation = self.lock().begin_load();
        let context = format!("history of {}", self.key);

        let fetched = match self
            .bounded(self.fetch_history(), Operation::Fetch, &context)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(conversation = %self.key, error = %e, "Failed to load messages");
                let mut store = self.lock();
                if store.reset(generation) {
                    self.changed(&store);
                }
                return Err(e);
            }
        };

        let messages = self.attach_senders(fetched).await;
        let mut store = self.lock();
        if store.apply_load(generation, messages) {
            info!(conversation = %self.key, count = store.len(), "Messages loaded");
            self.changed(&store);
        }
        Ok(store.len())
    }

    async fn fetch_history(&self) -> std::result::Result<Vec<RemoteMessage>, RemoteError> {
        match &self.conversation.kind {
            ConversationKind::Private { peer_user_id, .. } => {
                self.remote
                    .fetch_private_messages(&self.session, *peer_user_id)
                    .await
            }
            ConversationKind::Group { group_id, .. } => {
                self.remote
                    .fetch_group_messages(&self.session, *group_id)
                    .await
            }
        }
    }

    /// Build store entries; in a group, name every sender other than the
    /// current user with one lookup per distinct sender.
    async fn attach_senders(&self, fetched: Vec<RemoteMessage>) -> Vec<Message> {
        let me = self.me();
        let names = if self.conversation.is_group() {
            let others: Vec<UserId> = fetched
                .iter()
                .map(|m| m.sender_id)
                .filter(|id| *id != me)
                .collect();
            self.senders.display_names(others).await
        } else {
            Default::default()
        };

        fetched
            .into_iter()
            .map(|m| {
                let mut message = Message::confirmed(
                    m.id,
                    self.key,
                    m.sender_id,
                    m.text,
                    m.timestamp,
                    m.edited,
                );
                message.sender_display_name = names.get(&m.sender_id).cloned();
                message
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Send
    // -----------------------------------------------------------------------

    fn recipient(&self) -> Recipient {
        match &self.conversation.kind {
            ConversationKind::Private { peer_user_id, .. } => Recipient::User(*peer_user_id),
            ConversationKind::Group { group_id, .. } => Recipient::Group(*group_id),
        }
    }

    /// Append `text` as a pending message and create it remotely.
    ///
    /// On failure the entry stays in the sequence as failed, a
    /// [`SyncEvent::SendFailed`] is emitted, and the error is returned.
    pub async fn send(&self, text: &str) -> Result<SendReceipt> {
        let (correlation_id, local_ts) = {
            let mut store = self.lock();
            let correlation_id = store.begin_send(text, now_ms())?;
            let local_ts = store
                .by_correlation(correlation_id)
                .map_or_else(now_ms, |m| m.timestamp);
            self.changed(&store);
            (correlation_id, local_ts)
        };
        debug!(conversation = %self.key, correlation = %correlation_id, "Optimistic send");

        let draft = NewMessage {
            sender_id: self.me(),
            text: text.to_string(),
            recipient: self.recipient(),
        };
        let context = format!("send to {}", self.key);
        let outcome = self
            .bounded(
                self.remote.create_message(&self.session, &draft),
                Operation::Create,
                &context,
            )
            .await;

        let mut store = self.lock();
        match outcome {
            Ok(created) => {
                store.confirm_send(correlation_id, created.id, created.timestamp);
                self.changed(&store);
                info!(
                    conversation = %self.key,
                    correlation = %correlation_id,
                    id = ?created.id,
                    "Message confirmed"
                );
                Ok(SendReceipt {
                    correlation_id,
                    id: created.id,
                    timestamp: created.timestamp.unwrap_or(local_ts),
                })
            }
            Err(e) => {
                store.fail_send(correlation_id, e.to_string());
                self.changed(&store);
                drop(store);
                warn!(conversation = %self.key, correlation = %correlation_id, error = %e, "Send failed");
                self.events.emit(SyncEvent::SendFailed {
                    key: self.key,
                    correlation_id,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Re-send a failed message as a fresh optimistic send.
    pub async fn retry(&self, correlation_id: CorrelationId) -> Result<SendReceipt> {
        let failed = self.take_failed(correlation_id)?;
        info!(conversation = %self.key, correlation = %correlation_id, "Retrying failed send");
        self.send(&failed.text).await
    }

    /// Drop a failed message from the sequence.
    pub fn discard(&self, correlation_id: CorrelationId) -> Result<Message> {
        self.take_failed(correlation_id)
    }

    fn take_failed(&self, correlation_id: CorrelationId) -> Result<Message> {
        let mut store = self.lock();
        let failed = store.take_failed(correlation_id).ok_or_else(|| {
            SyncError::Validation(format!("no failed send {correlation_id}"))
        })?;
        self.changed(&store);
        Ok(failed)
    }

    // -----------------------------------------------------------------------
    // Edit / delete
    // -----------------------------------------------------------------------

    /// Replace the text of one of the current user's messages once the
    /// remote store accepts it.
    pub async fn edit(&self, id: MessageId, new_text: &str) -> Result<()> {
        validate_text(new_text)?;
        self.lock().check_owned(id, self.me())?;

        let context = format!("edit of message {id}");
        self.bounded(
            self.remote.edit_message(&self.session, id, new_text),
            Operation::Edit,
            &context,
        )
        .await?;

        let mut store = self.lock();
        if store.apply_edit(id, new_text) {
            self.changed(&store);
        } else {
            debug!(message = %id, "Edited message no longer in view");
        }
        Ok(())
    }

    /// Remove one of the current user's messages once the remote store
    /// confirms the deletion. On failure the message stays.
    pub async fn delete(&self, id: MessageId) -> Result<()> {
        self.lock().check_owned(id, self.me())?;

        let context = format!("delete of message {id}");
        self.bounded(
            self.remote.delete_message(&self.session, id),
            Operation::Delete,
            &context,
        )
        .await?;

        let mut store = self.lock();
        if store.remove(id).is_some() {
            self.changed(&store);
        }
        Ok(())
    }
}
