//! Paginated query-result cache.
//!
//! Sits between list resolvers and the data store. A stored result window
//! for a key can answer any later request under the same key whose window
//! lies inside it; anything else falls through to the fetcher.
//!
//! # Hit rule
//!
//! With a stored window fetched at offset `O` holding `n` records, a request
//! for `[O', O' + L')` is a hit iff the entry is live, `O' >= O`, and
//! `O' + L' <= O + n` (an empty request only needs `O' >= O`). The answer is
//! `stored[O' - O .. O' - O + L']`. Requests without a limit never hit.
//!
//! # Staleness
//!
//! Entries expire purely by TTL. Writes to the underlying data are not
//! observed, so a hit may be up to one TTL behind storage. Mutation paths
//! that need tighter bounds can call [`PaginatedCache::invalidate`].
//!
//! # Example
//!
//! ```ignore
//! let cache: PaginatedCache<QueryTerms, Post> = PaginatedCache::with_defaults();
//! let key = CacheKey::for_view("userPosts", [user_id.as_str()]);
//!
//! let posts = cache
//!     .resolve(terms, Arc::clone(&fetcher), Some(&key), None)
//!     .await?;
//! ```

pub mod entry;
pub mod memory;
pub mod read;
pub mod read_through;
pub mod slice;
pub mod traits;

pub use entry::CacheEntry;
pub use memory::InMemoryCacheStore;
pub use read::{CacheRead, ReadSource};
pub use read_through::PaginatedCache;
pub use slice::{plan_slice, MissReason};
pub use traits::{CacheStats, CacheStore};
