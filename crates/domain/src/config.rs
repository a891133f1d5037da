//! Engine configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CACHE_TIMEOUT_MS, DEFAULT_MAX_CACHE_ENTRIES, DEFAULT_MAX_RETRIES, DEFAULT_QUEUE_PATH,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_JITTER_FACTOR, DEFAULT_RETRY_MAX_DELAY_MS,
    DEFAULT_TIMEOUT_MS, DEFAULT_TOKEN_PATH,
};
use crate::errors::{EngineError, EngineResult};

/// Options recognized by the request engine
///
/// Every field except `apiBase` has a default, so a config file only needs to
/// name the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Base URL prepended to every endpoint
    pub api_base: String,
    /// Lifetime of cached responses
    pub cache_timeout_ms: u64,
    /// Total attempt budget per request, first attempt included
    pub max_retries: u32,
    /// Upper bound for a single request
    pub timeout_ms: u64,
    pub max_cache_entries: usize,
    pub enable_cache: bool,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter_factor: f64,
    /// JSON file backing the offline queue
    pub queue_path: PathBuf,
    /// File backing the durable token store
    pub token_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            cache_timeout_ms: DEFAULT_CACHE_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            enable_cache: true,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            retry_jitter_factor: DEFAULT_RETRY_JITTER_FACTOR,
            queue_path: PathBuf::from(DEFAULT_QUEUE_PATH),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
        }
    }
}

impl EngineConfig {
    /// Defaults pointed at `api_base`
    pub fn new(api_base: impl Into<String>) -> Self {
        Self { api_base: api_base.into(), ..Self::default() }
    }

    /// Check ranges and required fields
    pub fn validate(&self) -> EngineResult<()> {
        let base = self.api_base.trim();
        if base.is_empty() {
            return Err(EngineError::config("apiBase is required"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(EngineError::config(format!(
                "apiBase must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.timeout_ms == 0 {
            return Err(EngineError::config("timeoutMs must be greater than zero"));
        }
        if self.cache_timeout_ms == 0 {
            return Err(EngineError::config("cacheTimeoutMs must be greater than zero"));
        }
        if self.max_cache_entries == 0 {
            return Err(EngineError::config("maxCacheEntries must be greater than zero"));
        }
        if self.retry_base_delay_ms == 0 {
            return Err(EngineError::config("retryBaseDelayMs must be greater than zero"));
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(EngineError::config(format!(
                "retryBaseDelayMs ({}) cannot exceed retryMaxDelayMs ({})",
                self.retry_base_delay_ms, self.retry_max_delay_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.retry_jitter_factor) {
            return Err(EngineError::config(format!(
                "retryJitterFactor must be within 0.0..=1.0, got {}",
                self.retry_jitter_factor
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    /// `apiBase` joined with `endpoint`, without doubling the slash
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), endpoint.trim_start_matches('/'))
    }
}
