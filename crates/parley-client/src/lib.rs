//! # parley-client
//!
//! Synchronization core of the Parley messaging client.
//!
//! The [`SyncEngine`] keeps the conversation list and the open conversation
//! consistent with the remote store while letting the user send, edit and
//! delete without waiting on the network:
//!
//! - [`ConversationDirectory`] lists conversations and tracks which one is open.
//! - [`ChatRoom`] drives the [`MessageStore`](parley_store::MessageStore) of the
//!   open conversation: loads, optimistic sends, confirmed edits and deletes.
//! - [`SenderDirectory`] resolves group senders to display names, once per user.
//!
//! Progress and failures are broadcast as [`SyncEvent`]s.

pub mod chat;
pub mod config;
pub mod conversations;
pub mod engine;
pub mod events;
pub mod senders;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatRoom, SendReceipt};
pub use config::ClientConfig;
pub use conversations::{ConversationDirectory, Selection};
pub use engine::SyncEngine;
pub use events::{EventSink, SyncEvent};
pub use senders::SenderDirectory;
