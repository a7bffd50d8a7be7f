//! windowcache Storage - Paginated Query-Result Cache
//!
//! Stores fetched list windows per cache key and answers later requests for
//! windows inside them without going back to the data store. The fetcher,
//! the choice of key, and the record type are supplied by the caller.

pub mod cache;

pub use cache::{
    plan_slice, CacheEntry, CacheRead, CacheStats, CacheStore, InMemoryCacheStore, MissReason,
    PaginatedCache, ReadSource,
};

// Re-export the core types callers need alongside the cache.
pub use windowcache_core::{
    fetcher_fn, CacheConfig, CacheKey, Clock, FetchError, PageFetcher, PageWindow, PagedQuery,
    QueryTerms, StoreError, SystemClock, WindowCacheError, WindowCacheResult,
};
