//! # parley-store
//!
//! In-memory message state for one open conversation.
//!
//! A [`MessageStore`] holds the ordered message sequence and the
//! reconciliation rules that merge remote confirmations into optimistic
//! entries. It performs no I/O: the client crate drives it around its remote
//! calls, so every rule here is synchronous and testable on its own.

pub mod messages;

pub use messages::{format_display_time, validate_text, MessageStore, ScrollAnchor};
