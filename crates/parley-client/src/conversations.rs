use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use parley_net::{Operation, RemoteStore};
use parley_shared::{Conversation, ConversationKey, Result, SessionContext, SyncError, UserId};

/// Outcome of [`ConversationDirectory::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Opened(ConversationKey),
    Closed(ConversationKey),
}

#[derive(Debug, Default)]
struct DirectoryState {
    conversations: Vec<Conversation>,
    active: Option<ConversationKey>,
    contacts_panel_open: bool,
    generation: u64,
}

/// The user's conversations, most recent activity first, and which one is
/// open.
#[derive(Clone)]
pub struct ConversationDirectory {
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
    request_timeout: Duration,
    state: Arc<Mutex<DirectoryState>>,
}

impl ConversationDirectory {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        session: Arc<SessionContext>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            session,
            request_timeout,
            state: Arc::new(Mutex::new(DirectoryState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the conversation list. On failure or timeout the list becomes
    /// empty and the error is returned; nothing is retried.
    pub async fn load(&self) -> Result<Vec<Conversation>> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.generation
        };

        let user = self.session.user_id();
        let fetched = match tokio::time::timeout(
            self.request_timeout,
            self.remote.list_conversations(&self.session),
        )
        .await
        {
            Ok(result) => result.map_err(|e| e.into_sync(Operation::Fetch, "conversation list")),
            Err(_) => Err(Operation::Fetch.timed_out("conversation list", self.request_timeout)),
        };

        let mut state = self.lock();
        let current = state.generation == generation;
        match fetched {
            Ok(mut conversations) => {
                sort_conversations(&mut conversations, user);
                if current {
                    state.conversations = conversations.clone();
                }
                info!(count = conversations.len(), user = %user, "Conversations loaded");
                Ok(conversations)
            }
            Err(e) => {
                if current {
                    state.conversations.clear();
                }
                warn!(user = %user, error = %e, "Failed to load conversations");
                Err(e)
            }
        }
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.lock().conversations.clone()
    }

    pub fn get(&self, key: ConversationKey) -> Option<Conversation> {
        let user = self.session.user_id();
        self.lock()
            .conversations
            .iter()
            .find(|c| c.key(user) == key)
            .cloned()
    }

    pub fn active(&self) -> Option<ConversationKey> {
        self.lock().active
    }

    /// Toggle `key`: selecting the open conversation closes it, selecting
    /// another one switches to it. Either way the contacts panel closes.
    pub fn select(&self, key: ConversationKey) -> Result<Selection> {
        self.ensure_known(key)?;
        let mut state = self.lock();
        state.contacts_panel_open = false;
        if state.active == Some(key) {
            state.active = None;
            Ok(Selection::Closed(key))
        } else {
            state.active = Some(key);
            Ok(Selection::Opened(key))
        }
    }

    /// Make `key` the open conversation without toggling.
    pub fn open(&self, key: ConversationKey) -> Result<()> {
        self.ensure_known(key)?;
        let mut state = self.lock();
        state.contacts_panel_open = false;
        state.active = Some(key);
        Ok(())
    }

    pub fn close(&self) -> Option<ConversationKey> {
        self.lock().active.take()
    }

    pub fn toggle_contacts_panel(&self) -> bool {
        let mut state = self.lock();
        state.contacts_panel_open = !state.contacts_panel_open;
        state.contacts_panel_open
    }

    pub fn contacts_panel_open(&self) -> bool {
        self.lock().contacts_panel_open
    }

    /// Update the preview of `key` after a new message and restore the
    /// ordering. Returns `false` if the conversation is not listed.
    pub fn record_activity(
        &self,
        key: ConversationKey,
        preview: &str,
        timestamp: i64,
        sent_by_me: bool,
    ) -> bool {
        let user = self.session.user_id();
        let mut state = self.lock();
        let Some(conversation) = state.conversations.iter_mut().find(|c| c.key(user) == key)
        else {
            return false;
        };
        if timestamp < conversation.last_message_timestamp {
            return true;
        }
        conversation.last_message_preview = preview.to_string();
        conversation.last_message_timestamp = timestamp;
        conversation.sent_by_me = sent_by_me;
        sort_conversations(&mut state.conversations, user);
        true
    }

    fn ensure_known(&self, key: ConversationKey) -> Result<()> {
        if self.get(key).is_none() {
            return Err(SyncError::Validation(format!("unknown conversation {key}")));
        }
        Ok(())
    }
}

/// Most recent activity first, ties by conversation key.
fn sort_conversations(conversations: &mut [Conversation], user: UserId) {
    conversations.sort_by(|a, b| {
        b.last_message_timestamp
            .cmp(&a.last_message_timestamp)
            .then_with(|| a.key(user).cmp(&b.key(user)))
    });
}
