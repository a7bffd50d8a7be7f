//! Error types for windowcache operations
//!
//! A cache miss is never an error. Everything here is either a failure of a
//! collaborator (the page fetcher, the backing store) or a bad configuration.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page fetcher.
///
/// The cache never produces these itself; it hands whatever the fetcher
/// returned back to the caller untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Fetch from {source_name} failed: {reason}")]
    Failed { source_name: String, reason: String },

    #[error("Backing store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Fetch timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Cache store errors.
///
/// The in-memory store never fails. Stores backed by something that can
/// (a remote cache, a shared process) report through `Backend`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store backend error: {reason}")]
    Backend { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all windowcache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowCacheError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The task running a refresh ended without producing a result
    /// (the fetcher panicked or the runtime shut down).
    #[error("Refresh aborted: {reason}")]
    RefreshAborted { reason: String },
}

/// Result type alias for windowcache operations.
pub type WindowCacheResult<T> = Result<T, WindowCacheError>;

// =============================================================================
// TESTS
// =============================================================================
