/// Application name
pub const APP_NAME: &str = "Parley";

/// Default base URL of the remote message store
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Default HTTP request timeout in milliseconds
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Default HTTP connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Upper bound on how long a mutation may stay in flight before it is failed
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Maximum accepted response body (4 MiB)
pub const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Capacity of the engine event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Prefix shown in a conversation preview when the current user sent the last message
pub const SENT_BY_ME_PREFIX: &str = "YOU: ";

/// Rendered instead of a timestamp chrono cannot represent
pub const INVALID_TIME_PLACEHOLDER: &str = "--";
