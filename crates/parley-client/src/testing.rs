//! In-memory remote store for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use parley_net::{CreatedMessage, NewMessage, RemoteError, RemoteMessage, RemoteStore, Result};
use parley_shared::{
    Conversation, ConversationKind, Credential, GroupId, MessageId, SessionContext, User, UserId,
};

pub(crate) const ME: UserId = UserId(1);

pub(crate) fn session() -> Arc<SessionContext> {
    Arc::new(SessionContext::new(ME, Credential::new("token")))
}

pub(crate) fn dm(peer: i64, first: &str, ts: i64) -> Conversation {
    Conversation {
        kind: ConversationKind::Private {
            peer_user_id: UserId(peer),
            peer_first_name: first.to_string(),
            peer_last_name: "Test".to_string(),
        },
        last_message_preview: format!("from {first}"),
        last_message_timestamp: ts,
        sent_by_me: false,
    }
}

pub(crate) fn group(id: i64, name: &str, ts: i64) -> Conversation {
    Conversation {
        kind: ConversationKind::Group {
            group_id: GroupId(id),
            group_name: name.to_string(),
        },
        last_message_preview: String::new(),
        last_message_timestamp: ts,
        sent_by_me: false,
    }
}

pub(crate) fn remote_msg(id: i64, sender: i64, text: &str, ts: i64) -> RemoteMessage {
    RemoteMessage {
        id: MessageId(id),
        sender_id: UserId(sender),
        text: text.to_string(),
        timestamp: ts,
        edited: false,
    }
}

#[derive(Default)]
struct State {
    conversations: Vec<Conversation>,
    private: HashMap<UserId, Vec<RemoteMessage>>,
    groups: HashMap<GroupId, Vec<RemoteMessage>>,
    users: HashMap<UserId, User>,
    fail_list: bool,
    malformed_history: bool,
    hang_mutations: bool,
    forbid_edits: bool,
    fail_deletes: bool,
    send_delays: HashMap<String, Duration>,
    history_delay: Option<Duration>,
    failing_sends: HashSet<String>,
    history_calls: usize,
    resolve_calls: HashMap<UserId, usize>,
    created: Vec<NewMessage>,
    edits: Vec<(MessageId, String)>,
    deletes: Vec<MessageId>,
    next_id: i64,
    clock: i64,
}

/// Scriptable [`RemoteStore`]. Created messages get ids from 101 and
/// timestamps from 1000, both assigned in request order.
pub(crate) struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 101,
                clock: 1000,
                ..State::default()
            }),
        }
    }

    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub(crate) fn conversation(self, c: Conversation) -> Self {
        self.with(|s| s.conversations.push(c))
    }

    pub(crate) fn private_history(self, peer: i64, messages: Vec<RemoteMessage>) -> Self {
        self.with(|s| {
            s.private.insert(UserId(peer), messages);
        })
    }

    pub(crate) fn group_history(self, group: i64, messages: Vec<RemoteMessage>) -> Self {
        self.with(|s| {
            s.groups.insert(GroupId(group), messages);
        })
    }

    pub(crate) fn user(self, id: i64, first: &str, last: &str) -> Self {
        self.with(|s| {
            s.users.insert(
                UserId(id),
                User {
                    id: UserId(id),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                },
            );
        })
    }

    pub(crate) fn failing_list(self) -> Self {
        self.with(|s| s.fail_list = true)
    }

    pub(crate) fn malformed_history(self) -> Self {
        self.with(|s| s.malformed_history = true)
    }

    pub(crate) fn hanging_mutations(self) -> Self {
        self.with(|s| s.hang_mutations = true)
    }

    pub(crate) fn forbidding_edits(self) -> Self {
        self.with(|s| s.forbid_edits = true)
    }

    pub(crate) fn failing_deletes(self) -> Self {
        self.with(|s| s.fail_deletes = true)
    }

    pub(crate) fn delay_send(self, text: &str, ms: u64) -> Self {
        self.with(|s| {
            s.send_delays
                .insert(text.to_string(), Duration::from_millis(ms));
        })
    }

    pub(crate) fn failing_send(self, text: &str) -> Self {
        self.with(|s| {
            s.failing_sends.insert(text.to_string());
        })
    }

    pub(crate) fn set_failing_send(&self, text: &str, failing: bool) {
        let mut s = self.state.lock().unwrap();
        if failing {
            s.failing_sends.insert(text.to_string());
        } else {
            s.failing_sends.remove(text);
        }
    }

    /// History fetches snapshot the data on arrival and reply after `ms`.
    pub(crate) fn set_history_delay(&self, ms: u64) {
        self.state.lock().unwrap().history_delay = Some(Duration::from_millis(ms));
    }

    pub(crate) fn push_private(&self, peer: i64, message: RemoteMessage) {
        let mut s = self.state.lock().unwrap();
        s.private.entry(UserId(peer)).or_default().push(message);
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.state.lock().unwrap().history_calls
    }

    pub(crate) fn resolve_calls(&self, user: i64) -> usize {
        let s = self.state.lock().unwrap();
        s.resolve_calls.get(&UserId(user)).copied().unwrap_or(0)
    }

    pub(crate) fn total_resolve_calls(&self) -> usize {
        self.state.lock().unwrap().resolve_calls.values().sum()
    }

    pub(crate) fn created(&self) -> Vec<NewMessage> {
        self.state.lock().unwrap().created.clone()
    }

    pub(crate) fn edits(&self) -> Vec<(MessageId, String)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub(crate) fn deletes(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().deletes.clone()
    }

    fn hangs(&self) -> bool {
        self.state.lock().unwrap().hang_mutations
    }
}

fn check(session: &SessionContext) -> Result<()> {
    session.bearer().map(|_| ()).ok_or(RemoteError::MissingCredential)
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn list_conversations(&self, session: &SessionContext) -> Result<Vec<Conversation>> {
        check(session)?;
        let s = self.state.lock().unwrap();
        if s.fail_list {
            return Err(RemoteError::Status(503));
        }
        Ok(s.conversations.clone())
    }

    async fn fetch_private_messages(
        &self,
        session: &SessionContext,
        peer: UserId,
    ) -> Result<Vec<RemoteMessage>> {
        check(session)?;
        let (snapshot, delay) = {
            let mut s = self.state.lock().unwrap();
            s.history_calls += 1;
            if s.malformed_history {
                return Err(RemoteError::Schema("expected an array, got object".into()));
            }
            (s.private.get(&peer).cloned().unwrap_or_default(), s.history_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn fetch_group_messages(
        &self,
        session: &SessionContext,
        group: GroupId,
    ) -> Result<Vec<RemoteMessage>> {
        check(session)?;
        let mut s = self.state.lock().unwrap();
        s.history_calls += 1;
        if s.malformed_history {
            return Err(RemoteError::Schema("expected an array, got object".into()));
        }
        Ok(s.groups.get(&group).cloned().unwrap_or_default())
    }

    async fn resolve_user(&self, session: &SessionContext, user: UserId) -> Result<User> {
        check(session)?;
        *self
            .state
            .lock()
            .unwrap()
            .resolve_calls
            .entry(user)
            .or_default() += 1;
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.state
            .lock()
            .unwrap()
            .users
            .get(&user)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn create_message(
        &self,
        session: &SessionContext,
        message: &NewMessage,
    ) -> Result<CreatedMessage> {
        check(session)?;
        let (created, delay, fails) = {
            let mut s = self.state.lock().unwrap();
            s.created.push(message.clone());
            let created = CreatedMessage {
                id: Some(MessageId(s.next_id)),
                timestamp: Some(s.clock),
            };
            s.next_id += 1;
            s.clock += 1;
            (
                created,
                s.send_delays.get(&message.text).copied(),
                s.failing_sends.contains(&message.text),
            )
        };
        if self.hangs() {
            futures::future::pending::<()>().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fails {
            return Err(RemoteError::Status(500));
        }
        Ok(created)
    }

    async fn edit_message(
        &self,
        session: &SessionContext,
        id: MessageId,
        text: &str,
    ) -> Result<()> {
        check(session)?;
        if self.hangs() {
            futures::future::pending::<()>().await;
        }
        let mut s = self.state.lock().unwrap();
        if s.forbid_edits {
            return Err(RemoteError::Forbidden);
        }
        s.edits.push((id, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, session: &SessionContext, id: MessageId) -> Result<()> {
        check(session)?;
        if self.hangs() {
            futures::future::pending::<()>().await;
        }
        let mut s = self.state.lock().unwrap();
        if s.fail_deletes {
            return Err(RemoteError::Status(500));
        }
        s.deletes.push(id);
        Ok(())
    }
}
