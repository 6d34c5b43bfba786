//! # parley-shared
//!
//! Types shared by every Parley crate: identifiers, the conversation and
//! message model, the session context handed to components that talk to the
//! remote store, and the error taxonomy surfaced to the presentation layer.

pub mod constants;
pub mod error;
pub mod session;
pub mod time;
pub mod types;

pub use error::{Result, SyncError};
pub use session::{Credential, SessionContext};
pub use types::*;
