//! Resolve behaviour against a counting fetcher.
//!
//! Each test drives the public `PaginatedCache` API and checks both the
//! records returned and whether the fetcher was consulted.

use std::sync::Arc;
use std::time::Duration;

use windowcache_storage::{
    CacheKey, CacheStore, FetchError, MissReason, PaginatedCache, QueryTerms, WindowCacheError,
};
use windowcache_test_utils::{
    init_test_tracing, record_range, CountingFetcher, ManualClock, Record,
};

// ============================================================================
// HELPERS
// ============================================================================

struct Harness {
    cache: PaginatedCache<QueryTerms, Record>,
    clock: Arc<ManualClock>,
    fetcher: Arc<CountingFetcher>,
    key: CacheKey,
}

impl Harness {
    fn new() -> Self {
        init_test_tracing();
        let clock = Arc::new(ManualClock::default());
        Self {
            cache: PaginatedCache::with_defaults().with_clock(clock.clone()),
            clock,
            fetcher: Arc::new(CountingFetcher::with_records(100)),
            key: CacheKey::from("K"),
        }
    }

    async fn get(&self, offset: usize, limit: usize) -> Vec<Record> {
        self.cache
            .resolve(page(offset, limit), self.fetcher.clone(), Some(&self.key), None)
            .await
            .expect("resolve should succeed")
    }

    /// Key "K" populated with [0, 10), holding r0..r9.
    async fn populated() -> Self {
        let harness = Self::new();
        assert_eq!(harness.get(0, 10).await, record_range(0, 10));
        assert_eq!(harness.fetcher.calls(), 1);
        harness
    }
}

fn page(offset: usize, limit: usize) -> QueryTerms {
    QueryTerms::new()
        .with_view("frontpage")
        .with_offset(offset)
        .with_limit(limit)
}

// ============================================================================
// HITS, MISSES, AND FAILURES
// ============================================================================

#[tokio::test]
async fn test_prefix_of_stored_window_is_served_from_cache() {
    let harness = Harness::populated().await;

    assert_eq!(harness.get(0, 5).await, record_range(0, 5));
    assert_eq!(harness.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_inner_window_is_served_from_cache() {
    let harness = Harness::populated().await;

    // 3 + 4 = 7 <= 0 + 10
    assert_eq!(harness.get(3, 4).await, record_range(3, 4));
    assert_eq!(harness.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_window_past_stored_end_refetches() {
    let harness = Harness::populated().await;

    // 0 + 15 = 15 > 10
    assert_eq!(harness.get(0, 15).await, record_range(0, 15));
    assert_eq!(harness.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_request_after_default_ttl_refetches() {
    let harness = Harness::populated().await;

    harness.clock.advance(Duration::from_secs(601));
    let read = harness
        .cache
        .resolve_read(page(0, 5), harness.fetcher.clone(), Some(&harness.key), None)
        .await
        .expect("resolve");

    assert_eq!(read.miss_reason(), Some(MissReason::Expired));
    assert_eq!(read.into_value(), record_range(0, 5));
    assert_eq!(harness.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_no_key_calls_fetcher_every_time() {
    let harness = Harness::new();

    for _ in 0..2 {
        let rows = harness
            .cache
            .resolve(page(0, 10), harness.fetcher.clone(), None, None)
            .await
            .expect("resolve");
        assert_eq!(rows, record_range(0, 10));
    }

    assert_eq!(harness.fetcher.calls(), 2);
    assert_eq!(harness.cache.store().len().await.expect("len"), 0);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_entry() {
    let harness = Harness::populated().await;
    harness.fetcher.fail_with(FetchError::Failed {
        source_name: "posts".to_string(),
        reason: "connection reset".to_string(),
    });

    // Not coverable by the stored window, so this goes to the fetcher.
    let err = harness
        .cache
        .resolve(page(0, 15), harness.fetcher.clone(), Some(&harness.key), None)
        .await
        .expect_err("fetch failure should propagate");
    assert_eq!(
        err,
        WindowCacheError::Fetch(FetchError::Failed {
            source_name: "posts".to_string(),
            reason: "connection reset".to_string(),
        })
    );
    assert_eq!(harness.fetcher.calls(), 2);

    // The old [0, 10) entry still answers.
    assert_eq!(harness.get(0, 5).await, record_range(0, 5));
    assert_eq!(harness.fetcher.calls(), 2);

    let entry = harness
        .cache
        .store()
        .get(&harness.key)
        .await
        .expect("get")
        .expect("entry kept");
    assert_eq!(entry.len(), 10);
}

// ============================================================================
// EDGE CASES
// ============================================================================

#[tokio::test]
async fn test_earlier_offset_misses_and_replaces_entry() {
    let harness = Harness::new();
    harness.get(10, 10).await;

    let read = harness
        .cache
        .resolve_read(page(5, 2), harness.fetcher.clone(), Some(&harness.key), None)
        .await
        .expect("resolve");
    assert_eq!(read.miss_reason(), Some(MissReason::CachedWindowStartsLater));
    assert_eq!(read.into_value(), record_range(5, 2));

    // The miss replaced [10, 20) with [5, 7).
    let entry = harness
        .cache
        .store()
        .get(&harness.key)
        .await
        .expect("get")
        .expect("entry");
    assert_eq!(entry.query_terms.offset, Some(5));
    assert_eq!(entry.len(), 2);
    assert_eq!(harness.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_exact_boundaries_are_hits() {
    let harness = Harness::populated().await;

    assert_eq!(harness.get(0, 10).await, record_range(0, 10));
    assert_eq!(harness.get(9, 1).await, record_range(9, 1));
    assert_eq!(harness.fetcher.calls(), 1);

    assert_eq!(harness.get(9, 2).await, record_range(9, 2));
    assert_eq!(harness.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_zero_limit_is_served_empty() {
    let harness = Harness::populated().await;

    assert!(harness.get(4, 0).await.is_empty());
    assert!(harness.get(10, 0).await.is_empty());
    assert_eq!(harness.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_missing_offset_and_limit_use_defaults() {
    let harness = Harness::populated().await;

    // No offset means 0.
    let terms = QueryTerms::new().with_view("frontpage").with_limit(3);
    let rows = harness
        .cache
        .resolve(terms, harness.fetcher.clone(), Some(&harness.key), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(0, 3));
    assert_eq!(harness.fetcher.calls(), 1);

    // No limit means unbounded, which a stored window can never prove it covers.
    let terms = QueryTerms::new().with_view("frontpage");
    let read = harness
        .cache
        .resolve_read(terms, harness.fetcher.clone(), Some(&harness.key), None)
        .await
        .expect("resolve");
    assert_eq!(read.miss_reason(), Some(MissReason::InsufficientRecords));
    assert_eq!(read.into_value(), record_range(0, 100));
    assert_eq!(harness.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_short_final_page_only_covers_returned_records() {
    init_test_tracing();
    let cache: PaginatedCache<QueryTerms, Record> = PaginatedCache::with_defaults();
    let fetcher = Arc::new(CountingFetcher::with_records(14));
    let key = CacheKey::from("K");

    // Asks for [10, 20) but only 4 records exist past position 10.
    let rows = cache
        .resolve(page(10, 10), fetcher.clone(), Some(&key), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(10, 4));

    let rows = cache
        .resolve(page(11, 3), fetcher.clone(), Some(&key), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(11, 3));
    assert_eq!(fetcher.calls(), 1);

    // Asking for more than was returned refetches even though the collection
    // has nothing more to give.
    let rows = cache
        .resolve(page(11, 5), fetcher.clone(), Some(&key), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(11, 3));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_mutating_returned_rows_does_not_touch_store() {
    let harness = Harness::new();

    let mut fetched = harness.get(0, 10).await;
    fetched[0].title = "edited".to_string();
    fetched.clear();

    let mut hit = harness.get(0, 5).await;
    assert_eq!(hit, record_range(0, 5));
    hit[1] = Record::at(999);
    hit.push(Record::at(1000));

    assert_eq!(harness.get(0, 5).await, record_range(0, 5));
    assert_eq!(harness.get(0, 10).await, record_range(0, 10));
    assert_eq!(harness.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_keys_are_independent() {
    let harness = Harness::new();
    let other = CacheKey::from("K2");

    harness.get(0, 10).await;
    harness
        .cache
        .resolve(page(50, 10), harness.fetcher.clone(), Some(&other), None)
        .await
        .expect("resolve");

    assert_eq!(harness.get(2, 2).await, record_range(2, 2));
    let rows = harness
        .cache
        .resolve(page(55, 5), harness.fetcher.clone(), Some(&other), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(55, 5));
    assert_eq!(harness.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_stale_data_is_served_until_expiry() {
    let harness = Harness::populated().await;

    // The backing data changes; the cache does not notice until the TTL runs out.
    let mut changed = record_range(0, 100);
    changed[0].title = "retitled".to_string();
    harness.fetcher.set_records(changed.clone());

    harness.clock.advance(Duration::from_secs(599));
    assert_eq!(harness.get(0, 1).await, record_range(0, 1));

    harness.clock.advance(Duration::from_secs(1));
    assert_eq!(harness.get(0, 1).await, changed[..1].to_vec());
    assert_eq!(harness.fetcher.calls(), 2);
}

/// A key must pin down the filter/sort identity. The cache cannot tell two
/// filters apart when they share a key and will serve one filter's records
/// for the other. This test documents that behaviour; it is a caller bug.
#[tokio::test]
async fn test_shared_key_across_filters_serves_wrong_records() {
    init_test_tracing();
    let cache: PaginatedCache<QueryTerms, Record> = PaginatedCache::with_defaults();
    let shared = CacheKey::from("posts");

    let newest = Arc::new(CountingFetcher::new(record_range(0, 20)));
    let top = Arc::new(CountingFetcher::new(record_range(500, 20)));

    let rows = cache
        .resolve(page(0, 10).with_term("sortedBy", "new"), newest.clone(), Some(&shared), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(0, 10));

    let rows = cache
        .resolve(page(0, 5).with_term("sortedBy", "top"), top.clone(), Some(&shared), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(0, 5));
    assert_eq!(top.calls(), 0);

    // Distinct keys keep them apart.
    let top_key = CacheKey::for_view("posts", ["top"]);
    let rows = cache
        .resolve(page(0, 5).with_term("sortedBy", "top"), top.clone(), Some(&top_key), None)
        .await
        .expect("resolve");
    assert_eq!(rows, record_range(500, 5));
}
