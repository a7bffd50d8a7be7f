//! Read-through cache for paginated list queries.
//!
//! A keyed request is answered by slicing the stored window for that key when
//! the stored window is live and covers the request. Otherwise the fetcher is
//! called and its result replaces the stored window.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use windowcache_core::{
    CacheConfig, CacheKey, Clock, PageFetcher, PagedQuery, SystemClock, Timestamp,
    WindowCacheError, WindowCacheResult,
};

use super::entry::CacheEntry;
use super::memory::InMemoryCacheStore;
use super::read::CacheRead;
use super::slice::MissReason;
use super::traits::{CacheStats, CacheStore};

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    refresh_failures: AtomicU64,
}

/// Paginated query-result cache.
///
/// # Type Parameters
///
/// - `Q`: Query terms; only `offset` and `limit` are read
/// - `R`: Record type returned by the fetcher
/// - `S`: The store holding one entry per key
///
/// # Key contract
///
/// A [`CacheKey`] must identify everything about a query except its offset
/// and limit. The cache never compares filters or sort orders: two different
/// queries sharing a key will be served each other's records.
///
/// # Example
///
/// ```ignore
/// let cache = PaginatedCache::with_defaults();
/// let key = CacheKey::for_view("frontpage", ["new"]);
///
/// // First call fetches [0, 10) and stores it.
/// let page = cache.resolve(terms.with_limit(10), fetcher.clone(), Some(&key), None).await?;
///
/// // [3, 7) is sliced from the stored window without calling the fetcher.
/// let page = cache
///     .resolve(terms.with_offset(3).with_limit(4), fetcher.clone(), Some(&key), None)
///     .await?;
/// ```
pub struct PaginatedCache<Q, R, S = InMemoryCacheStore<Q, R>>
where
    Q: Send + Sync + 'static,
    R: Send + Sync + 'static,
    S: CacheStore<Q, R>,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    counters: Arc<CacheCounters>,
    /// Set once the key-count warning has been logged.
    key_warning_logged: Arc<AtomicBool>,
    _marker: std::marker::PhantomData<fn() -> (Q, R)>,
}

impl<Q, R> PaginatedCache<Q, R, InMemoryCacheStore<Q, R>>
where
    Q: PagedQuery + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// In-memory cache with the given configuration.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(Arc::new(InMemoryCacheStore::new()), config)
    }

    /// In-memory cache with default configuration.
    pub fn with_defaults() -> Self {
        Self::in_memory(CacheConfig::default())
    }

    /// In-memory cache configured from `WINDOWCACHE_*` environment variables.
    pub fn from_env() -> WindowCacheResult<Self> {
        let config = CacheConfig::from_env();
        config.validate()?;
        tracing::info!(
            default_ttl_secs = config.default_ttl.as_secs(),
            key_warning_threshold = config.key_warning_threshold,
            "Window cache configured"
        );
        Ok(Self::in_memory(config))
    }
}

impl<Q, R, S> PaginatedCache<Q, R, S>
where
    Q: PagedQuery + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    S: CacheStore<Q, R> + 'static,
{
    pub fn new(store: Arc<S>, config: CacheConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
            counters: Arc::new(CacheCounters::default()),
            key_warning_logged: Arc::new(AtomicBool::new(false)),
            _marker: std::marker::PhantomData,
        }
    }

    /// Replace the time source used for stamping and expiring entries.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a list query, serving it from the store when possible.
    ///
    /// - Without a `key` the fetcher is always called and nothing is stored.
    /// - With a `key`, a live stored window covering the request is sliced
    ///   and returned without calling the fetcher.
    /// - Otherwise the fetcher is called and, if it succeeds, its result
    ///   replaces the stored window with a lifetime of `ttl` (or the
    ///   configured default).
    ///
    /// Fetcher errors are returned unchanged and leave the store untouched.
    /// The returned records are an owned copy.
    ///
    /// Inside a tokio runtime a miss is refreshed on a spawned task that
    /// outlives a cancelled caller. Without one, the refresh runs inline.
    pub async fn resolve<F>(
        &self,
        terms: Q,
        fetcher: Arc<F>,
        key: Option<&CacheKey>,
        ttl: Option<Duration>,
    ) -> WindowCacheResult<Vec<R>>
    where
        F: PageFetcher<Q, R> + 'static,
    {
        self.resolve_read(terms, fetcher, key, ttl)
            .await
            .map(CacheRead::into_value)
    }

    /// Same as [`resolve`](Self::resolve), also reporting whether the records
    /// came from the store.
    pub async fn resolve_read<F>(
        &self,
        terms: Q,
        fetcher: Arc<F>,
        key: Option<&CacheKey>,
        ttl: Option<Duration>,
    ) -> WindowCacheResult<CacheRead<Vec<R>>>
    where
        F: PageFetcher<Q, R> + 'static,
    {
        let Some(key) = key else {
            self.counters.bypassed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(window = %terms.window(), "No cache key, fetching directly");
            let rows = fetcher.fetch(&terms).await?;
            return Ok(CacheRead::bypassed(rows, self.clock.now()));
        };

        let requested = terms.window();
        let reason = match self.store.get(key).await? {
            Some(entry) => match entry.slice_at(requested, self.clock.now()) {
                Ok(rows) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        key = %key,
                        requested = %requested,
                        cached = %entry.window(),
                        returned = rows.len(),
                        "Window cache hit"
                    );
                    return Ok(CacheRead::from_cache(rows, entry.cached_at, entry.expires_at));
                }
                Err(reason) => reason,
            },
            None => MissReason::Absent,
        };

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, requested = %requested, reason = %reason, "Window cache miss");

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        match self.refresh(key.clone(), terms, fetcher, ttl).await {
            Ok((rows, cached_at, expires_at)) => {
                Ok(CacheRead::from_fetch(rows, reason, cached_at, expires_at))
            }
            Err(err) => {
                self.counters.refresh_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %err, "Window refresh failed, keeping previous entry");
                Err(err)
            }
        }
    }

    /// Fetch and store on a detached task.
    ///
    /// The caller only awaits the task's handle, so dropping the caller does
    /// not cancel the fetch or the store write. The store is written only
    /// after the fetch succeeded. Outside a tokio runtime there is nothing to
    /// spawn onto, so the same work runs inline and is cancelled with the
    /// caller.
    async fn refresh<F>(
        &self,
        key: CacheKey,
        terms: Q,
        fetcher: Arc<F>,
        ttl: Duration,
    ) -> WindowCacheResult<(Vec<R>, Timestamp, Timestamp)>
    where
        F: PageFetcher<Q, R> + 'static,
    {
        let work = Refresh {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            key_warning_logged: Arc::clone(&self.key_warning_logged),
            key_warning_threshold: self.config.key_warning_threshold,
        }
        .run(key, terms, fetcher, ttl);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.spawn(work).await.map_err(|e| {
                WindowCacheError::RefreshAborted {
                    reason: e.to_string(),
                }
            })?,
            Err(_) => {
                tracing::trace!("No tokio runtime, refreshing inline");
                work.await
            }
        }
    }

    /// How long ago the records in `read` were fetched, measured with this
    /// cache's clock.
    pub fn staleness_of<T>(&self, read: &CacheRead<T>) -> Duration {
        read.staleness_at(self.clock.now())
    }

    /// Drop the stored window for `key`. Returns whether one existed.
    ///
    /// Nothing in the cache calls this; mutation paths that want fresher
    /// reads than the TTL allows can.
    pub async fn invalidate(&self, key: &CacheKey) -> WindowCacheResult<bool> {
        let removed = self.store.remove(key).await?;
        if removed {
            tracing::debug!(key = %key, "Window cache entry invalidated");
        }
        Ok(removed)
    }

    /// Drop every stored window.
    pub async fn invalidate_all(&self) -> WindowCacheResult<u64> {
        let removed = self.store.clear().await?;
        tracing::debug!(removed, "Window cache cleared");
        Ok(removed)
    }

    /// Snapshot of usage counters.
    pub async fn stats(&self) -> WindowCacheResult<CacheStats> {
        Ok(CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
            refresh_failures: self.counters.refresh_failures.load(Ordering::Relaxed),
            entry_count: self.store.len().await?,
        })
    }
}

/// Everything a refresh needs from the cache, owned so it can move onto a
/// spawned task.
struct Refresh<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    key_warning_logged: Arc<AtomicBool>,
    key_warning_threshold: usize,
}

impl<S> Refresh<S> {
    async fn run<Q, R, F>(
        self,
        key: CacheKey,
        terms: Q,
        fetcher: Arc<F>,
        ttl: Duration,
    ) -> WindowCacheResult<(Vec<R>, Timestamp, Timestamp)>
    where
        Q: PagedQuery + Send + Sync + 'static,
        R: Clone + Send + Sync + 'static,
        S: CacheStore<Q, R> + 'static,
        F: PageFetcher<Q, R> + 'static,
    {
        let rows = fetcher.fetch(&terms).await?;

        let entry = CacheEntry::new(terms, rows, self.clock.now(), ttl);
        let returned = entry.result.to_vec();
        let (cached_at, expires_at) = (entry.cached_at, entry.expires_at);
        self.store.set(key, entry).await?;

        let stored_keys = self.store.len().await?;
        if stored_keys > self.key_warning_threshold as u64
            && !self.key_warning_logged.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                stored_keys,
                threshold = self.key_warning_threshold,
                "Window cache key count exceeds threshold; entries are never evicted"
            );
        }

        Ok((returned, cached_at, expires_at))
    }
}

impl<Q, R, S> Clone for PaginatedCache<Q, R, S>
where
    Q: Send + Sync + 'static,
    R: Send + Sync + 'static,
    S: CacheStore<Q, R>,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
            key_warning_logged: Arc::clone(&self.key_warning_logged),
            _marker: std::marker::PhantomData,
        }
    }
}
