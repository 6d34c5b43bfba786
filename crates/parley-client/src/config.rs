//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start against a local
//! development server with zero configuration.

use std::time::Duration;

use chrono::FixedOffset;

use parley_net::RemoteConfig;
use parley_shared::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_REQUEST_TIMEOUT_MS};
use parley_shared::time;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Remote store connection settings.
    pub remote: RemoteConfig,

    /// How long a load or mutation may stay in flight before it is failed.
    /// Env: `PARLEY_REQUEST_TIMEOUT_MS`
    /// Default: `15000`
    pub request_timeout_ms: u64,

    /// Offset from UTC, in minutes, used when rendering timestamps.
    /// Env: `PARLEY_DISPLAY_OFFSET_MINUTES`
    /// Default: `0`
    pub display_offset_minutes: i32,

    /// Env: `PARLEY_EVENT_CAPACITY`
    /// Default: `64`
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            display_offset_minutes: 0,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            remote: RemoteConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(val) = lookup("PARLEY_REQUEST_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.request_timeout_ms = ms,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid PARLEY_REQUEST_TIMEOUT_MS, using default"
                ),
            }
        }

        if let Some(val) = lookup("PARLEY_DISPLAY_OFFSET_MINUTES") {
            match val.parse::<i32>() {
                Ok(minutes) if minutes.abs() < 24 * 60 => config.display_offset_minutes = minutes,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid PARLEY_DISPLAY_OFFSET_MINUTES, using default"
                ),
            }
        }

        if let Some(val) = lookup("PARLEY_EVENT_CAPACITY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.event_capacity = n,
                _ => tracing::warn!(value = %val, "Invalid PARLEY_EVENT_CAPACITY, using default"),
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn display_offset(&self) -> FixedOffset {
        time::offset_from_minutes(self.display_offset_minutes)
    }
}
