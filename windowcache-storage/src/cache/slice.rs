//! Window compatibility check.
//!
//! Decides whether a stored window `[cached_offset, cached_offset + cached_len)`
//! can answer a requested window, and if so which sub-range of the stored
//! records to hand back. Anything that cannot be proven safe is a miss.

use std::fmt;
use std::ops::Range;

use windowcache_core::PageWindow;

/// Why a lookup could not be answered from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissReason {
    /// Nothing stored under the key.
    Absent,
    /// The stored entry is at or past its expiry time.
    Expired,
    /// The stored window starts after the requested offset, so the leading
    /// records of the request were never fetched.
    CachedWindowStartsLater,
    /// After realigning to the requested offset, fewer records remain than
    /// the request asks for. Unbounded requests always land here.
    InsufficientRecords,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Expired => "expired",
            Self::CachedWindowStartsLater => "cached_window_starts_later",
            Self::InsufficientRecords => "insufficient_records",
        }
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the range of stored records that answers `requested`.
///
/// `cached_offset` is the offset the stored result was fetched with and
/// `cached_len` the number of records actually returned. On success the
/// range always has length `requested.limit` exactly.
pub fn plan_slice(
    cached_offset: usize,
    cached_len: usize,
    requested: PageWindow,
) -> Result<Range<usize>, MissReason> {
    if cached_offset > requested.offset {
        return Err(MissReason::CachedWindowStartsLater);
    }

    // Realign the front. Skipping past the end leaves nothing available.
    let skip = (requested.offset - cached_offset).min(cached_len);
    let available = cached_len - skip;

    let Some(limit) = requested.limit else {
        return Err(MissReason::InsufficientRecords);
    };
    if available < limit {
        return Err(MissReason::InsufficientRecords);
    }

    // available >= limit: keep the first `limit` records after the skip.
    Ok(skip..skip + limit)
}
