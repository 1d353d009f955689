//! In-memory TTL cache backed by `DashMap`, used for static assets that the
//! backend serves once per session (location tables, the location tree).

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single cached value with its expiration time.
struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with time-to-live expiration.
///
/// Values are stored behind `Arc` so large parsed assets are shared rather
/// than cloned. Expired entries are lazily evicted on the next `get` call
/// for that key.
pub struct MemoryCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V> MemoryCache<V> {
    /// Creates a new cache with the given time-to-live for entries.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let entry = self.store.get(key)?;
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    /// Inserts or overwrites an entry and returns the shared handle to it.
    pub fn set(&self, key: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.store.insert(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                expires_at: Instant::now() + self.ttl,
            },
        );
        value
    }

    /// Number of entries, including ones that expired but were not yet evicted.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        self.store.clear();
    }
}
