//! Cache statistics

/// Point-in-time counters for a [`TtlLruCache`](super::TtlLruCache)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries (expired entries not yet read are included)
    pub size: usize,

    /// Maximum number of entries
    pub capacity: usize,

    /// Lookups that returned a live value
    pub hits: u64,

    /// Lookups that found nothing or an expired value
    pub misses: u64,

    /// Insert operations, including overwrites
    pub inserts: u64,

    /// Entries dropped to make room for a new key
    pub evictions: u64,

    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    /// Hits divided by total lookups, 0.0 when nothing was looked up yet
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}
