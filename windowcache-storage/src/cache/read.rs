//! Resolve results carrying where the data came from.

use chrono::Utc;
use std::time::Duration;
use windowcache_core::Timestamp;

use super::slice::MissReason;

/// Where the records of a [`CacheRead`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Sliced out of a live stored entry.
    Cache,
    /// Fetched because the lookup missed; the fetch was stored.
    Fetched { reason: MissReason },
    /// Fetched without a key; nothing was stored.
    Bypassed,
}

/// Result of a resolve call with provenance metadata.
///
/// The records themselves are the same whichever way they were obtained;
/// this wrapper only reports how.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
    /// When the underlying data was fetched from storage.
    fetched_at: Timestamp,
    /// Expiry of the backing entry; `None` when nothing was stored.
    expires_at: Option<Timestamp>,
}

impl<T> CacheRead<T> {
    /// A read answered from a stored entry.
    pub fn from_cache(value: T, fetched_at: Timestamp, expires_at: Timestamp) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
            fetched_at,
            expires_at: Some(expires_at),
        }
    }

    /// A read answered by a fetch that refreshed the store.
    pub fn from_fetch(
        value: T,
        reason: MissReason,
        fetched_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            value,
            source: ReadSource::Fetched { reason },
            fetched_at,
            expires_at: Some(expires_at),
        }
    }

    /// A read made without a key.
    pub fn bypassed(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            source: ReadSource::Bypassed,
            fetched_at,
            expires_at: None,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    pub fn was_cache_hit(&self) -> bool {
        matches!(self.source, ReadSource::Cache)
    }

    /// True for any read that called the fetcher, keyed or not.
    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit()
    }

    pub fn was_bypassed(&self) -> bool {
        matches!(self.source, ReadSource::Bypassed)
    }

    pub fn miss_reason(&self) -> Option<MissReason> {
        match self.source {
            ReadSource::Fetched { reason } => Some(reason),
            ReadSource::Cache | ReadSource::Bypassed => None,
        }
    }

    /// How long before `now` the data was fetched.
    ///
    /// `fetched_at` comes from the resolving cache's clock, so `now` must come
    /// from the same clock; [`PaginatedCache::staleness_of`] does that.
    ///
    /// [`PaginatedCache::staleness_of`]: super::PaginatedCache::staleness_of
    pub fn staleness_at(&self, now: Timestamp) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// How long ago the data was fetched, by the wall clock.
    ///
    /// Only meaningful for caches running on the system clock.
    pub fn staleness(&self) -> Duration {
        self.staleness_at(Utc::now())
    }

    /// Map the inner value to a new type.
    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            source: self.source,
            fetched_at: self.fetched_at,
            expires_at: self.expires_at,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
