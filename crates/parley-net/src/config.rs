//! Remote store connection settings, loaded from environment variables.

use parley_shared::constants::{
    APP_NAME, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HTTP_TIMEOUT_MS,
    MAX_RESPONSE_BYTES,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Root of the REST API.
    /// Env: `PARLEY_BASE_URL`
    /// Default: `http://localhost:8081`
    pub base_url: String,

    /// Whole-request timeout.
    /// Env: `PARLEY_HTTP_TIMEOUT_MS`
    pub timeout_ms: u64,

    /// Env: `PARLEY_CONNECT_TIMEOUT_MS`
    pub connect_timeout_ms: u64,

    pub user_agent: String,

    /// Bodies larger than this are rejected before decoding.
    pub max_response_bytes: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            user_agent: format!("{}/{}", APP_NAME.to_lowercase(), env!("CARGO_PKG_VERSION")),
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }
}

impl RemoteConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PARLEY_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        if let Some(val) = lookup("PARLEY_HTTP_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout_ms = ms,
                _ => tracing::warn!(value = %val, "Invalid PARLEY_HTTP_TIMEOUT_MS, using default"),
            }
        }

        if let Some(val) = lookup("PARLEY_CONNECT_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.connect_timeout_ms = ms,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid PARLEY_CONNECT_TIMEOUT_MS, using default"
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = RemoteConfig::default();
        assert_eq!(config.base_url, "http://localhost:8081");
        assert_eq!(config.timeout_ms, 10_000);
        assert!(config.user_agent.starts_with("parley/"));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("PARLEY_BASE_URL", "https://chat.example.org"),
            ("PARLEY_HTTP_TIMEOUT_MS", "2500"),
            ("PARLEY_CONNECT_TIMEOUT_MS", "zero"),
        ]
        .into_iter()
        .collect();
        let config = RemoteConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_url, "https://chat.example.org");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.connect_timeout_ms, 5_000);
    }
}
