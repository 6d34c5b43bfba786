use std::collections::{HashMap, HashSet};

use chrono::FixedOffset;
use tracing::{debug, warn};

use parley_shared::time;
use parley_shared::{
    ConversationKey, CorrelationId, Message, MessageId, Result, SyncError, SyncState, UserId,
};

/// Where the view should be scrolled: the most recent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollAnchor {
    pub index: usize,
    pub id: Option<MessageId>,
    pub correlation_id: Option<CorrelationId>,
}

/// Ordered messages of one conversation.
///
/// Entries are kept in non-decreasing `timestamp` order, ties in insertion
/// order. Locally initiated sends are tracked by their [`CorrelationId`] until
/// they resolve.
#[derive(Debug, Clone)]
pub struct MessageStore {
    key: ConversationKey,
    owner: UserId,
    messages: Vec<Message>,
    load_generation: u64,
    /// Edits and deletes confirmed since the last `begin_load`, replayed over
    /// the fetched snapshot.
    confirmed_edits: HashMap<MessageId, String>,
    confirmed_deletes: HashSet<MessageId>,
}

impl MessageStore {
    /// `owner` is the signed-in user; only their messages may be edited or
    /// deleted.
    pub fn new(key: ConversationKey, owner: UserId) -> Self {
        Self {
            key,
            owner,
            messages: Vec::new(),
            load_generation: 0,
            confirmed_edits: HashMap::new(),
            confirmed_deletes: HashSet::new(),
        }
    }

    pub fn key(&self) -> ConversationKey {
        self.key
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == Some(id))
    }

    pub fn by_correlation(&self, correlation_id: CorrelationId) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.correlation_id == Some(correlation_id))
    }

    pub fn scroll_anchor(&self) -> Option<ScrollAnchor> {
        let index = self.messages.len().checked_sub(1)?;
        let last = &self.messages[index];
        Some(ScrollAnchor {
            index,
            id: last.id,
            correlation_id: last.correlation_id,
        })
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Start a load. Results of earlier loads become stale.
    pub fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.confirmed_edits.clear();
        self.confirmed_deletes.clear();
        self.load_generation
    }

    /// Replace the fetched history. Local entries that the remote store has
    /// not confirmed yet (pending or failed sends) are kept, and edits and
    /// deletes confirmed while the fetch was in flight are applied on top.
    ///
    /// Returns `false` and changes nothing when `generation` is stale.
    pub fn apply_load(&mut self, generation: u64, fetched: Vec<Message>) -> bool {
        if generation != self.load_generation {
            debug!(conversation = %self.key, generation, "Dropping stale load");
            return false;
        }
        let is_group = self.key.is_group();
        let mut next: Vec<Message> = fetched
            .into_iter()
            .filter(|m| !m.id.is_some_and(|id| self.confirmed_deletes.contains(&id)))
            .map(|mut m| {
                m.conversation_key = self.key;
                if !is_group {
                    m.sender_display_name = None;
                }
                if let Some(text) = m.id.and_then(|id| self.confirmed_edits.get(&id)) {
                    m.text = text.clone();
                    m.edited = true;
                }
                m
            })
            .collect();
        next.extend(self.take_unconfirmed());
        self.messages = next;
        self.resort();
        self.confirmed_edits.clear();
        self.confirmed_deletes.clear();
        true
    }

    /// Clear the fetched history after a failed load, keeping unconfirmed
    /// local entries. Returns `false` when `generation` is stale.
    pub fn reset(&mut self, generation: u64) -> bool {
        if generation != self.load_generation {
            return false;
        }
        self.messages = self.take_unconfirmed();
        self.confirmed_edits.clear();
        self.confirmed_deletes.clear();
        true
    }

    fn take_unconfirmed(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
            .into_iter()
            .filter(|m| m.sync_state != SyncState::Confirmed)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Append a pending entry for `text` and return its correlation id.
    ///
    /// The entry's timestamp is `now_ms`, raised to the last entry's
    /// timestamp if the local clock is behind, so the tail stays ordered.
    pub fn begin_send(&mut self, text: &str, now_ms: i64) -> Result<CorrelationId> {
        validate_text(text)?;
        let timestamp = self
            .messages
            .last()
            .map_or(now_ms, |last| now_ms.max(last.timestamp));
        let correlation_id = CorrelationId::new();
        self.messages.push(Message {
            id: None,
            correlation_id: Some(correlation_id),
            conversation_key: self.key,
            sender_id: self.owner,
            text: text.to_string(),
            timestamp,
            edited: false,
            sender_display_name: None,
            sync_state: SyncState::Pending,
            failure: None,
        });
        Ok(correlation_id)
    }

    /// Reconcile a pending entry with its confirmation.
    ///
    /// Remote id and timestamp are adopted when present. If a reload already
    /// brought the confirmed message in, the pending entry is dropped instead
    /// of duplicating it. Without an id the fetched copy is recognised by
    /// sender, text and the confirmed timestamp; a bare acknowledgement with
    /// neither cannot be matched and is kept. Returns `false` if no pending
    /// entry carries `correlation_id`.
    pub fn confirm_send(
        &mut self,
        correlation_id: CorrelationId,
        id: Option<MessageId>,
        timestamp: Option<i64>,
    ) -> bool {
        let Some(pos) = self.pending_position(correlation_id) else {
            warn!(conversation = %self.key, correlation = %correlation_id, "Confirmation for unknown send");
            return false;
        };

        let already_fetched = match (id, timestamp) {
            (Some(id), _) => self.get(id).is_some(),
            (None, Some(ts)) => {
                let text = &self.messages[pos].text;
                self.messages.iter().any(|m| {
                    m.id.is_some()
                        && m.sender_id == self.owner
                        && m.timestamp == ts
                        && m.text == *text
                })
            }
            (None, None) => false,
        };
        if already_fetched {
            debug!(conversation = %self.key, correlation = %correlation_id, "Send already present from reload");
            self.messages.remove(pos);
            return true;
        }

        let entry = &mut self.messages[pos];
        entry.id = id;
        if let Some(ts) = timestamp {
            entry.timestamp = ts;
        }
        entry.sync_state = SyncState::Confirmed;
        entry.failure = None;
        if timestamp.is_some() {
            self.resort();
        }
        true
    }

    /// Mark a pending entry as failed. The entry stays visible.
    pub fn fail_send(&mut self, correlation_id: CorrelationId, reason: impl Into<String>) -> bool {
        let Some(pos) = self.pending_position(correlation_id) else {
            return false;
        };
        let entry = &mut self.messages[pos];
        entry.sync_state = SyncState::Failed;
        entry.failure = Some(reason.into());
        true
    }

    /// Remove a failed entry, e.g. to discard or re-send it.
    pub fn take_failed(&mut self, correlation_id: CorrelationId) -> Option<Message> {
        let pos = self.messages.iter().position(|m| {
            m.correlation_id == Some(correlation_id) && m.sync_state == SyncState::Failed
        })?;
        Some(self.messages.remove(pos))
    }

    fn pending_position(&self, correlation_id: CorrelationId) -> Option<usize> {
        self.messages.iter().position(|m| {
            m.correlation_id == Some(correlation_id) && m.sync_state == SyncState::Pending
        })
    }

    // -----------------------------------------------------------------------
    // Edit / delete
    // -----------------------------------------------------------------------

    /// Check that `id` names a message `user` may modify.
    pub fn check_owned(&self, id: MessageId, user: UserId) -> Result<&Message> {
        let message = self
            .get(id)
            .ok_or_else(|| SyncError::Validation(format!("no message {id} in {}", self.key)))?;
        if message.sender_id != user || user != self.owner {
            return Err(SyncError::Permission { user, message: id });
        }
        Ok(message)
    }

    /// Replace the text of a confirmed edit. `edited` only ever becomes `true`.
    pub fn apply_edit(&mut self, id: MessageId, text: &str) -> bool {
        self.confirmed_edits.insert(id, text.to_string());
        match self.messages.iter_mut().find(|m| m.id == Some(id)) {
            Some(entry) => {
                entry.text = text.to_string();
                entry.edited = true;
                true
            }
            None => false,
        }
    }

    /// Drop a message whose deletion the remote store confirmed.
    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        self.confirmed_edits.remove(&id);
        self.confirmed_deletes.insert(id);
        let pos = self.messages.iter().position(|m| m.id == Some(id))?;
        Some(self.messages.remove(pos))
    }

    fn resort(&mut self) {
        // stable: equal timestamps keep insertion order
        self.messages.sort_by_key(|m| m.timestamp);
    }
}

/// Reject text that is empty once trimmed.
pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SyncError::Validation("message text is empty".into()));
    }
    Ok(())
}

/// `DD-MM-YYYY, HH:MM` for the message's timestamp.
pub fn format_display_time(message: &Message, offset: &FixedOffset) -> String {
    time::format_display_time(message.timestamp, offset)
}
