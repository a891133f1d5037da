//! Bounded in-memory caching
//!
//! [`TtlLruCache`] combines least-recently-used eviction with a per-entry
//! time-to-live. Expired entries are dropped lazily when they are read.

mod stats;
mod ttl_lru;

pub use stats::CacheStats;
pub use ttl_lru::TtlLruCache;
