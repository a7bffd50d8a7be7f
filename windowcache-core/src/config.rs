//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ConfigError, WindowCacheResult};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default lifetime of a stored window (10 minutes).
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Distinct key count above which a capacity warning is logged.
pub const DEFAULT_KEY_WARNING_THRESHOLD: usize = 1_000;

pub const ENV_DEFAULT_TTL_SECS: &str = "WINDOWCACHE_DEFAULT_TTL_SECS";
pub const ENV_KEY_WARNING_THRESHOLD: &str = "WINDOWCACHE_KEY_WARNING_THRESHOLD";

/// Configuration for the paginated cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied when a resolve call does not pass one.
    pub default_ttl: Duration,

    /// The store never evicts. Once the number of distinct keys passes this
    /// value a warning is logged, since keys derived from user input grow
    /// the store without bound.
    pub key_warning_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            key_warning_threshold: DEFAULT_KEY_WARNING_THRESHOLD,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create CacheConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `WINDOWCACHE_DEFAULT_TTL_SECS`: Default entry TTL (default: 600)
    /// - `WINDOWCACHE_KEY_WARNING_THRESHOLD`: Key count that triggers a capacity warning (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let default_ttl = Duration::from_secs(
            std::env::var(ENV_DEFAULT_TTL_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TTL_SECS),
        );

        let key_warning_threshold = std::env::var(ENV_KEY_WARNING_THRESHOLD)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_KEY_WARNING_THRESHOLD);

        Self {
            default_ttl,
            key_warning_threshold,
        }
    }

    /// Set the default TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the key warning threshold.
    pub fn with_key_warning_threshold(mut self, threshold: usize) -> Self {
        self.key_warning_threshold = threshold;
        self
    }

    /// Reject settings the cache cannot work with.
    pub fn validate(&self) -> WindowCacheResult<()> {
        if self.default_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "default_ttl".to_string(),
                value: format!("{:?}", self.default_ttl),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if self.key_warning_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "key_warning_threshold".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
