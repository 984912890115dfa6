//! # Cache Module
//!
//! Memoizes perceptual hashes so the same upload is only decoded once.
//!
//! An image is typically hashed twice: once for the pre-upload duplicate
//! warning and again when the extracted recipe is stored. Keying on the
//! content hash (not the raw bytes) keeps keys small and bounded.
//!
//! The cache is a pure performance optimization. Entries are immutable once
//! inserted, and a miss simply recomputes the same value.
//!
//! ## Backends
//! - `LruHashCache` - Bounded, thread-safe LRU map (default)
//! - `NoopCache` - Never stores anything

mod memory;

pub use memory::{LruHashCache, DEFAULT_CACHE_CAPACITY};

use serde::{Deserialize, Serialize};

/// Trait for perceptual hash caches
///
/// Implementations must be safe to share between request threads.
pub trait HashCache: Send + Sync {
    /// Look up the perceptual hash for a content hash
    fn get(&self, content_hash: &str) -> Option<String>;

    /// Remember the perceptual hash computed for a content hash
    fn insert(&self, content_hash: String, perceptual_hash: String);

    /// Drop every cached entry
    fn clear(&self);

    /// Get cache statistics
    fn stats(&self) -> CacheStats;
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries currently held
    pub entries: usize,
    /// Maximum number of entries before eviction
    pub capacity: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to recompute
    pub misses: u64,
}

/// A cache that never remembers anything.
///
/// Useful for tests that must exercise the full decode path every time.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl HashCache for NoopCache {
    fn get(&self, _content_hash: &str) -> Option<String> {
        None
    }

    fn insert(&self, _content_hash: String, _perceptual_hash: String) {}

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_cache_never_hits() {
        let cache = NoopCache;
        cache.insert("abc".to_string(), "0011223344556677".to_string());

        assert!(cache.get("abc").is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
