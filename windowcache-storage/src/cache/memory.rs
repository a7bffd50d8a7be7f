//! Process-local cache store.
//!
//! Entries live in a [`DashMap`], which shards its locks by key: `get` and
//! `set` on one key are atomic with respect to each other and never block
//! on other keys. Entries sit behind `Arc`, so a reader holding an entry is
//! unaffected when a writer replaces it.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use windowcache_core::{CacheKey, WindowCacheResult};

use super::entry::CacheEntry;
use super::traits::CacheStore;

/// In-memory store. Contents are lost when the process exits.
pub struct InMemoryCacheStore<Q, R> {
    entries: DashMap<CacheKey, Arc<CacheEntry<Q, R>>>,
}

impl<Q, R> InMemoryCacheStore<Q, R> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Keys currently holding an entry, in no particular order.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

impl<Q, R> Default for InMemoryCacheStore<Q, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q, R> std::fmt::Debug for InMemoryCacheStore<Q, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl<Q, R> CacheStore<Q, R> for InMemoryCacheStore<Q, R>
where
    Q: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> WindowCacheResult<Option<Arc<CacheEntry<Q, R>>>> {
        Ok(self.entries.get(key).map(|entry| Arc::clone(entry.value())))
    }

    async fn set(&self, key: CacheKey, entry: CacheEntry<Q, R>) -> WindowCacheResult<()> {
        self.entries.insert(key, Arc::new(entry));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> WindowCacheResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn clear(&self) -> WindowCacheResult<u64> {
        let removed = self.entries.len() as u64;
        self.entries.clear();
        Ok(removed)
    }

    async fn len(&self) -> WindowCacheResult<u64> {
        Ok(self.entries.len() as u64)
    }
}
