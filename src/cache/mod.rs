//! Time-bounded result cache.
//!
//! # Design Decisions
//! - Sharded concurrent map (DashMap); readers never block the whole cache
//! - Eviction is lazy: a stale entry is dropped only when `get` sees it
//! - No background sweeper, so stale entries that are never read again stay
//!   resident until the process restarts. Fine for the low-cardinality
//!   area keys this service produces; revisit before caching open-ended keys.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A stored value with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    /// An entry exactly `ttl` old is still fresh.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// A thread-safe key-value cache with a single per-cache TTL.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    inner: Arc<DashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value for `key` if it is still fresh.
    ///
    /// A stale entry is removed as a side effect. The removal re-checks
    /// staleness under the shard lock so a concurrent `set` is never lost.
    pub fn get(&self, key: &K) -> Option<V> {
        {
            let entry = self.inner.get(key)?;
            if !entry.is_stale(self.ttl) {
                return Some(entry.value.clone());
            }
        }

        let ttl = self.ttl;
        if self.inner.remove_if(key, |_, e| e.is_stale(ttl)).is_some() {
            tracing::trace!("Evicted stale cache entry");
        }
        None
    }

    /// Insert or overwrite `key`, stamping the current time.
    pub fn set(&self, key: K, value: V) {
        self.inner.insert(key, CacheEntry::new(value));
    }

    /// Number of stored entries, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_set_then_get() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert!(cache.get(&"a").is_none());

        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("a", 2);
        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_and_stays_gone() {
        let cache = TtlCache::new(Duration::from_millis(30));
        cache.set("a", "value".to_string());
        assert_eq!(cache.get(&"a").as_deref(), Some("value"));

        thread::sleep(Duration::from_millis(60));

        assert!(cache.get(&"a").is_none());
        assert!(cache.is_empty(), "stale entry should be evicted on read");
        assert!(cache.get(&"a").is_none());
    }

    #[test]
    fn test_unread_stale_entries_stay_resident() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set(1, ());
        cache.set(2, ());
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let other = cache.clone();
        cache.set("k", 7);
        assert_eq!(other.get(&"k"), Some(7));
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(t * 100 + i, i);
                        assert_eq!(cache.get(&(t * 100 + i)), Some(i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
