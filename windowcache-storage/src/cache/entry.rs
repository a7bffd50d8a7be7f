//! Stored result windows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use windowcache_core::{PageWindow, PagedQuery, Timestamp};

use super::slice::{plan_slice, MissReason};

/// One stored query result.
///
/// `result` holds the records at positions `[offset, offset + result.len())`
/// of the full ordered result set for `query_terms`, with no gaps. It is
/// never mutated after construction; readers get copies.
#[derive(Debug, Clone)]
pub struct CacheEntry<Q, R> {
    /// Terms the result was fetched with.
    pub query_terms: Q,
    /// The fetched records, in query order.
    pub result: Arc<[R]>,
    /// When the fetch completed.
    pub cached_at: Timestamp,
    /// First instant at which the entry may no longer be used.
    pub expires_at: Timestamp,
}

impl<Q, R> CacheEntry<Q, R> {
    /// Create an entry that lives for `ttl` after `cached_at`.
    ///
    /// A TTL too large to represent saturates at the latest UTC timestamp.
    pub fn new(query_terms: Q, result: Vec<R>, cached_at: Timestamp, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| cached_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            query_terms,
            result: result.into(),
            cached_at,
            expires_at,
        }
    }

    /// An entry is usable only while `now < expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

impl<Q: PagedQuery, R: Clone> CacheEntry<Q, R> {
    /// The window this entry was fetched for.
    pub fn window(&self) -> PageWindow {
        self.query_terms.window()
    }

    /// Copy out the records answering `requested`, ignoring expiry.
    pub fn slice(&self, requested: PageWindow) -> Result<Vec<R>, MissReason> {
        let range = plan_slice(self.window().offset, self.result.len(), requested)?;
        Ok(self.result[range].to_vec())
    }

    /// Copy out the records answering `requested` if the entry is still live
    /// at `now`.
    pub fn slice_at(&self, requested: PageWindow, now: Timestamp) -> Result<Vec<R>, MissReason> {
        if self.is_expired_at(now) {
            return Err(MissReason::Expired);
        }
        self.slice(requested)
    }
}
