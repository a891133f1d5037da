//! Domain constants
//!
//! Defaults for [`EngineConfig`](crate::EngineConfig) and limits shared by the
//! token and error handling code.

// Configuration defaults
pub const DEFAULT_CACHE_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 100;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_RETRY_JITTER_FACTOR: f64 = 0.3;
pub const DEFAULT_QUEUE_PATH: &str = "courier-queue.json";
pub const DEFAULT_TOKEN_PATH: &str = "courier-token";

// Tokens
pub const MIN_TOKEN_LENGTH: usize = 16;
pub const TOKEN_COOKIE_NAME: &str = "auth_token";
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

// User-facing error messages
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 200;
