//! Page fetcher trait: the cache's only route to the backing store.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::WindowCacheResult;

/// Fetches one window of records from storage.
///
/// Implementations must follow skip+limit semantics: for terms with
/// `offset = o` and `limit = l`, return the records at positions
/// `[o, o + l)` of the ordered result set, or fewer when the collection ends
/// first. The cache treats the returned list as ground truth and may call
/// `fetch` repeatedly with the same terms.
///
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// struct PostsFetcher { pool: PgPool }
///
/// #[async_trait]
/// impl PageFetcher<QueryTerms, Post> for PostsFetcher {
///     async fn fetch(&self, terms: &QueryTerms) -> WindowCacheResult<Vec<Post>> {
///         // SELECT ... OFFSET $1 LIMIT $2
///     }
/// }
/// ```
#[async_trait]
pub trait PageFetcher<Q, R>: Send + Sync
where
    Q: Send + Sync,
{
    /// Fetch the records for exactly this window.
    ///
    /// # Returns
    /// * `Ok(Vec<R>)` - Records in query order
    /// * `Err(_)` - Handed back to the caller of the cache unchanged
    async fn fetch(&self, terms: &Q) -> WindowCacheResult<Vec<R>>;
}

/// Adapter turning an async closure into a [`PageFetcher`].
pub struct FnFetcher<F, Q, R> {
    f: F,
    _marker: PhantomData<fn(Q) -> R>,
}

impl<F, Q, R> FnFetcher<F, Q, R> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

/// Wrap an async closure taking owned query terms.
///
/// ```ignore
/// let fetcher = Arc::new(fetcher_fn(|terms: QueryTerms| async move {
///     repo.list_posts(&terms).await
/// }));
/// ```
pub fn fetcher_fn<F, Fut, Q, R>(f: F) -> FnFetcher<F, Q, R>
where
    F: Fn(Q) -> Fut + Send + Sync,
    Fut: Future<Output = WindowCacheResult<Vec<R>>> + Send + 'static,
{
    FnFetcher::new(f)
}

#[async_trait]
impl<F, Fut, Q, R> PageFetcher<Q, R> for FnFetcher<F, Q, R>
where
    F: Fn(Q) -> Fut + Send + Sync,
    Fut: Future<Output = WindowCacheResult<Vec<R>>> + Send + 'static,
    Q: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    async fn fetch(&self, terms: &Q) -> WindowCacheResult<Vec<R>> {
        (self.f)(terms.clone()).await
    }
}
