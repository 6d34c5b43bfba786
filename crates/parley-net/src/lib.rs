//! # parley-net
//!
//! The logical contract of the remote message store and its HTTP binding.
//!
//! Everything the synchronization core needs from the server is expressed by
//! the [`RemoteStore`] trait. [`HttpRemoteStore`] implements it over REST with
//! bearer authentication and validates the shape of every response before it
//! reaches the core.

pub mod config;
pub mod error;
pub mod http;
pub mod remote;
pub mod urls;
pub mod wire;

pub use config::RemoteConfig;
pub use error::{Operation, RemoteError, Result};
pub use http::HttpRemoteStore;
pub use remote::{CreatedMessage, NewMessage, Recipient, RemoteMessage, RemoteStore};
