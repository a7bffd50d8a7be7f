//! windowcache Core - Query, Error, and Collaborator Types
//!
//! Pure data structures and the traits the cache uses to talk to the outside
//! world. The caching logic itself lives in windowcache-storage.

pub mod clock;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod query;

pub use clock::{Clock, SystemClock};
pub use config::{CacheConfig, DEFAULT_KEY_WARNING_THRESHOLD, DEFAULT_TTL_SECS};
pub use error::{ConfigError, FetchError, StoreError, WindowCacheError, WindowCacheResult};
pub use fetcher::{fetcher_fn, FnFetcher, PageFetcher};
pub use query::{CacheKey, PageWindow, PagedQuery, QueryTerms};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
