//! windowcache Test Utilities
//!
//! Shared test infrastructure for the windowcache workspace:
//! - Record fixtures with known logical positions
//! - A counting, failure-injectable page fetcher over an in-memory collection
//! - A manually advanced clock
//! - Proptest generators for windows and query terms

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

// Re-export core types for convenience
pub use windowcache_core::{
    CacheConfig, CacheKey, Clock, FetchError, PageFetcher, PageWindow, PagedQuery, QueryTerms,
    Timestamp, WindowCacheError, WindowCacheResult,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// A list record whose identity is its position in the full ordered set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub position: usize,
    pub id: String,
    pub title: String,
}

impl Record {
    pub fn at(position: usize) -> Self {
        Self {
            position,
            id: format!("r{}", position),
            title: format!("Post #{}", position),
        }
    }
}

/// Records at positions `[offset, offset + len)`.
pub fn record_range(offset: usize, len: usize) -> Vec<Record> {
    (offset..offset + len).map(Record::at).collect()
}

/// Apply skip+limit to a collection the way a database would.
pub fn apply_window<T: Clone>(records: &[T], window: PageWindow) -> Vec<T> {
    records
        .iter()
        .skip(window.offset)
        .take(window.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// MOCK FETCHER
// ============================================================================

/// Page fetcher over an in-memory collection.
///
/// Counts every call, remembers the windows it was asked for, and can be
/// switched into a failing mode to simulate an unavailable data store.
#[derive(Debug, Default)]
pub struct CountingFetcher {
    records: RwLock<Vec<Record>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<PageWindow>>,
    failure: Mutex<Option<FetchError>>,
}

impl CountingFetcher {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Default::default()
        }
    }

    /// Collection of `count` records at positions `0..count`.
    pub fn with_records(count: usize) -> Self {
        Self::new(record_range(0, count))
    }

    /// Number of times `fetch` has been called, failed calls included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Windows passed to `fetch`, in call order.
    pub fn requested_windows(&self) -> Vec<PageWindow> {
        lock(&self.requested).clone()
    }

    /// Make every following fetch fail with `error`.
    pub fn fail_with(&self, error: FetchError) {
        *lock(&self.failure) = Some(error);
    }

    /// Let fetches succeed again.
    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Replace the backing collection.
    pub fn set_records(&self, records: Vec<Record>) {
        *write_lock(&self.records) = records;
    }

    /// What a direct fetch would return right now, without counting a call.
    pub fn expected(&self, window: PageWindow) -> Vec<Record> {
        apply_window(&read_lock(&self.records), window)
    }
}

#[async_trait]
impl<Q> PageFetcher<Q, Record> for CountingFetcher
where
    Q: PagedQuery + Send + Sync,
{
    async fn fetch(&self, terms: &Q) -> WindowCacheResult<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let window = terms.window();
        lock(&self.requested).push(window);

        if let Some(error) = lock(&self.failure).clone() {
            return Err(error.into());
        }
        Ok(self.expected(window))
    }
}

// ============================================================================
// CLOCK
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        let mut now = lock(&self.now);
        *now += by;
    }

    pub fn set(&self, to: Timestamp) {
        *lock(&self.now) = to;
    }
}

impl Default for ManualClock {
    /// Starts at 2024-01-01T00:00:00Z.
    fn default() -> Self {
        Self::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *lock(&self.now)
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

/// Windows that may omit the limit.
pub fn window_strategy(max: usize) -> impl Strategy<Value = PageWindow> {
    (0..max, proptest::option::weighted(0.9, 0..max))
        .prop_map(|(offset, limit)| PageWindow::new(offset, limit))
}

/// Query terms for a fixed view, optionally omitting offset and limit.
pub fn query_terms_strategy(max: usize) -> impl Strategy<Value = QueryTerms> {
    (
        proptest::option::of(0..max),
        proptest::option::weighted(0.9, 0..max),
    )
        .prop_map(|(offset, limit)| QueryTerms {
            offset,
            limit,
            view: Some("frontpage".to_string()),
            ..Default::default()
        })
}

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
///
/// Respects `RUST_LOG`; defaults to debug output for the cache crates.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("windowcache_storage=debug,warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
