//! Bounded in-memory LRU cache backend.

use super::{CacheStats, HashCache};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::warn;

/// Default number of perceptual hashes kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Thread-safe LRU cache of perceptual hashes keyed by content hash.
///
/// `LruCache::get` reorders entries, so even reads take the lock
/// exclusively. Lookups are a single hash map access, so contention stays low.
pub struct LruHashCache {
    entries: Mutex<LruCache<String, String>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruHashCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl Default for LruHashCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl HashCache for LruHashCache {
    fn get(&self, content_hash: &str) -> Option<String> {
        let found = match self.entries.lock() {
            Ok(mut entries) => entries.get(content_hash).cloned(),
            Err(_) => {
                // A poisoned lock only means a panic elsewhere; recompute instead.
                warn!("perceptual hash cache lock poisoned, bypassing cache");
                None
            }
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn insert(&self, content_hash: String, perceptual_hash: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(content_hash, perceptual_hash);
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        CacheStats {
            entries,
            capacity: self.capacity.get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn cache_miss_returns_none() {
        let cache = LruHashCache::new(4);

        assert!(cache.get("missing").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn cache_hit_returns_entry() {
        let cache = LruHashCache::new(4);
        cache.insert("abc".to_string(), "ffee000000000000".to_string());

        assert_eq!(cache.get("abc").as_deref(), Some("ffee000000000000"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let cache = LruHashCache::new(2);
        cache.insert("a".to_string(), "1".to_string());
        cache.insert("b".to_string(), "2".to_string());

        // Touch "a" so "b" becomes the eviction candidate
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), "3".to_string());

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn clear_removes_all_entries() {
        let cache = LruHashCache::new(8);
        cache.insert("a".to_string(), "1".to_string());
        cache.insert("b".to_string(), "2".to_string());
        let _ = cache.get("a");

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.capacity, 8);
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let cache = LruHashCache::new(0);
        cache.insert("a".to_string(), "1".to_string());

        assert_eq!(cache.stats().capacity, 1);
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn concurrent_inserts_stay_bounded() {
        let cache = Arc::new(LruHashCache::new(16));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("{t}-{i}");
                        cache.insert(key.clone(), format!("{i:016x}"));
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.stats().entries, 16);
    }
}
