//! LRU cache with per-entry time-to-live
//!
//! Both `insert` and a successful `get` promote an entry to most recently
//! used. When the cache is full, inserting a new key evicts the least recently
//! used entry. TTL is checked against the configured [`Clock`] on every read.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use super::stats::CacheStats;
use crate::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    stats: CacheStats,
}

/// Thread-safe LRU cache where every entry carries its own TTL
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use courier_common::cache::TtlLruCache;
///
/// let cache: TtlLruCache<String, u32> = TtlLruCache::new(2);
/// cache.insert("a".to_string(), 1, Duration::from_secs(60));
/// assert_eq!(cache.get(&"a".to_string()), Some(1));
/// ```
pub struct TtlLruCache<K, V, C = SystemClock>
where
    K: Hash + Eq,
    C: Clock,
{
    inner: Mutex<Inner<K, V>>,
    clock: C,
}

impl<K: Hash + Eq, V: Clone> TtlLruCache<K, V, SystemClock> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, SystemClock)
    }
}

impl<K, V, C> TtlLruCache<K, V, C>
where
    K: Hash + Eq,
    V: Clone,
    C: Clock,
{
    /// Create a cache that reads time from `clock`
    pub fn with_clock(capacity: usize, clock: C) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats { capacity: capacity.get(), ..CacheStats::default() },
            }),
            clock,
        }
    }

    /// Return a live value and promote it, or `None` if absent or expired
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let lookup = inner.entries.get(key).map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                inner.stats.hits += 1;
                Some(value)
            }
            Some(None) => {
                inner.entries.pop(key);
                inner.stats.misses += 1;
                inner.stats.expirations += 1;
                trace!("cache entry expired on read");
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`, evicting the LRU entry when full
    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry { value, stored_at: self.clock.now(), ttl };
        let mut inner = self.inner.lock();

        let evicts = !inner.entries.contains(&key) && inner.entries.len() == inner.entries.cap().get();
        inner.entries.put(key, entry);

        inner.stats.inserts += 1;
        if evicts {
            inner.stats.evictions += 1;
            trace!("cache full, evicted least recently used entry");
        }
    }

    /// Remove an entry, returning its value if it was still live
    pub fn remove(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.inner.lock().entries.pop(key).filter(|entry| entry.is_live(now)).map(|e| e.value)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Snapshot of the current counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats { size: inner.entries.len(), ..inner.stats }
    }
}

impl<K, V, C> std::fmt::Debug for TtlLruCache<K, V, C>
where
    K: Hash + Eq,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TtlLruCache")
            .field("len", &inner.entries.len())
            .field("capacity", &inner.entries.cap())
            .finish()
    }
}
