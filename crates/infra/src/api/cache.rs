//! Response cache keyed by request identity

use std::sync::Arc;
use std::time::Duration;

use courier_common::cache::{CacheStats, TtlLruCache};
use courier_common::time::{Clock, SystemClock};
use courier_domain::{ApiResponse, RequestDescriptor};
use tracing::debug;

/// blake3 digest of a request's cache identity, as 64 hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(request: &RequestDescriptor) -> Self {
        Self::from_identity(&request.cache_identity())
    }

    /// Hash an arbitrary `METHOD:endpoint:body` identity string
    pub fn from_identity(identity: &str) -> Self {
        Self(hex::encode(blake3::hash(identity.as_bytes()).as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory LRU of parsed responses with per-entry TTL
///
/// Never persisted. Safe to clear at any time.
pub struct ResponseCache {
    entries: TtlLruCache<CacheKey, ApiResponse, Arc<dyn Clock>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self { entries: TtlLruCache::with_clock(capacity, clock) }
    }

    pub fn get(&self, key: &CacheKey) -> Option<ApiResponse> {
        let hit = self.entries.get(key);
        debug!(key = %key, hit = hit.is_some(), "response cache lookup");
        hit
    }

    pub fn set(&self, key: CacheKey, value: ApiResponse, ttl: Duration) {
        self.entries.insert(key, value, ttl);
    }

    /// Remove one entry; true if a live entry was removed
    pub fn delete(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
        debug!("response cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").field("entries", &self.entries).finish()
    }
}
