//! Cache store trait and usage statistics.
//!
//! This module defines the trait that must be implemented by stores holding
//! cached result windows.

use std::sync::Arc;

use async_trait::async_trait;
use windowcache_core::{CacheKey, WindowCacheResult};

use super::entry::CacheEntry;

/// Store trait for pluggable cache implementations.
///
/// Holds at most one [`CacheEntry`] per key. Implementations must make `get`
/// and `set` on the same key atomic with respect to each other: a reader
/// either sees the previous entry or the new one, never a partial write.
/// No locking across keys is required.
///
/// # Errors
///
/// Backends that can fail return
/// [`StoreError::Backend`](windowcache_core::StoreError::Backend) wrapped in
/// [`WindowCacheError::Store`](windowcache_core::WindowCacheError::Store).
/// The cache propagates these to the caller; a failed `set` after a
/// successful fetch fails the resolve call.
///
/// # Eviction
///
/// There is none. Entries are replaced wholesale by `set` and otherwise live
/// until removed or the process exits, so the number of distinct keys must
/// stay small and bounded by the application.
#[async_trait]
pub trait CacheStore<Q, R>: Send + Sync
where
    Q: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    /// Get the entry stored under `key`, if any. Expired entries are still
    /// returned; judging expiry is the caller's job.
    async fn get(&self, key: &CacheKey) -> WindowCacheResult<Option<Arc<CacheEntry<Q, R>>>>;

    /// Store `entry` under `key`, replacing whatever was there.
    async fn set(&self, key: CacheKey, entry: CacheEntry<Q, R>) -> WindowCacheResult<()>;

    /// Remove the entry under `key`. Returns whether one existed.
    async fn remove(&self, key: &CacheKey) -> WindowCacheResult<bool>;

    /// Remove every entry. Returns how many were removed.
    async fn clear(&self) -> WindowCacheResult<u64>;

    /// Number of keys currently holding an entry, expired or not.
    async fn len(&self) -> WindowCacheResult<u64>;

    async fn is_empty(&self) -> WindowCacheResult<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered by slicing a stored entry.
    pub hits: u64,
    /// Keyed requests that had to call the fetcher.
    pub misses: u64,
    /// Requests made without a key.
    pub bypassed: u64,
    /// Misses whose fetch failed; the previous entry was left in place.
    pub refresh_failures: u64,
    /// Number of entries currently in the store.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate over keyed requests (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            bypassed: 500,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
