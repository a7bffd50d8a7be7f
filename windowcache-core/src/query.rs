//! Query terms, pagination windows, and cache keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// PAGINATION
// ============================================================================

/// Anything that describes a paginated list query.
///
/// The cache only ever reads `offset` and `limit`. Every other field of the
/// implementing type is opaque to it and is assumed to be fixed for a given
/// [`CacheKey`].
pub trait PagedQuery {
    /// Number of records to skip. `None` means 0.
    fn offset(&self) -> Option<usize>;

    /// Maximum number of records to return. `None` means unbounded.
    fn limit(&self) -> Option<usize>;

    /// Normalized window with defaults applied.
    fn window(&self) -> PageWindow {
        PageWindow {
            offset: self.offset().unwrap_or(0),
            limit: self.limit(),
        }
    }
}

/// A contiguous range `[offset, offset + limit)` of an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    pub offset: usize,
    /// `None` is an unbounded window running to the end of the collection.
    pub limit: Option<usize>,
}

impl PageWindow {
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    pub fn bounded(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    pub fn unbounded(offset: usize) -> Self {
        Self {
            offset,
            limit: None,
        }
    }

    /// Exclusive end position, or `None` for an unbounded window.
    pub fn end(&self) -> Option<usize> {
        self.limit.map(|limit| self.offset.saturating_add(limit))
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none()
    }

    /// Whether `other` lies entirely inside this window, comparing declared
    /// bounds only.
    ///
    /// This is not the cache's hit rule. A stored result covers a request
    /// only as far as the records the fetch actually returned, and an
    /// unbounded request never hits; see `plan_slice` in windowcache-storage.
    pub fn declared_contains(&self, other: &PageWindow) -> bool {
        if other.offset < self.offset {
            return false;
        }
        match (self.end(), other.end()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(end), Some(other_end)) => other_end <= end,
        }
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::unbounded(0)
    }
}

impl fmt::Display for PageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end() {
            Some(end) => write!(f, "[{}, {})", self.offset, end),
            None => write!(f, "[{}, ..)", self.offset),
        }
    }
}

// ============================================================================
// QUERY TERMS
// ============================================================================

/// General-purpose query terms for a list view.
///
/// `terms` carries the filter and sort fields as JSON, the same shape a
/// GraphQL list resolver receives them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Named list view (e.g. "frontpage", "userPosts").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Remaining filter/sort fields.
    #[serde(default, flatten)]
    pub terms: Map<String, Value>,
}

impl QueryTerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn with_term(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.insert(name.into(), value.into());
        self
    }

    /// Same filter/sort identity, different window.
    pub fn paged(&self, window: PageWindow) -> Self {
        Self {
            offset: Some(window.offset),
            limit: window.limit,
            ..self.clone()
        }
    }
}

impl PagedQuery for QueryTerms {
    fn offset(&self) -> Option<usize> {
        self.offset
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl PagedQuery for PageWindow {
    fn offset(&self) -> Option<usize> {
        Some(self.offset)
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }
}

// ============================================================================
// CACHE KEY
// ============================================================================

/// Opaque cache key naming the filter/sort identity of a list query.
///
/// Two queries that share a key must differ only in `offset` and `limit`.
/// The cache cannot check this: reusing one key for two different filters
/// makes it serve records from the wrong query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a key from a view name and the values of its filter/sort fields.
    ///
    /// ```
    /// use windowcache_core::CacheKey;
    ///
    /// let key = CacheKey::for_view("userPosts", ["user-42", "new"]);
    /// assert_eq!(key.as_str(), "userPosts:user-42:new");
    /// ```
    pub fn for_view<I, S>(view: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = view.to_string();
        for field in fields {
            key.push(':');
            key.push_str(field.as_ref());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
