//! Configuration Module
//!
//! Cache durations and the purge interval, loadable from environment variables.

use std::env;

use chrono::Duration;

use crate::cache::{DEFAULT_LOAD_CACHE_DURATION_SECS, DEFAULT_SAVE_CACHE_DURATION_SECS};
use crate::error::{CacheError, Result};

/// Default interval between background purges, in seconds
pub const DEFAULT_PURGE_INTERVAL_SECS: i64 = 60;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Lifetime of entries created by a loading read
    pub load_cache_duration: Duration,
    /// Lifetime of entries written by `put` without an explicit duration
    pub save_cache_duration: Duration,
    /// Interval between background purge runs
    pub purge_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_LOAD_DURATION_SECS` - Load cache duration (default: 120)
    /// - `CACHE_SAVE_DURATION_SECS` - Save cache duration (default: 10)
    /// - `CACHE_PURGE_INTERVAL_SECS` - Purge frequency (default: 60)
    ///
    /// Unparsable or unrepresentable values fall back to the default;
    /// non-positive values are kept and rejected by [`validate`](Self::validate).
    pub fn from_env() -> Self {
        Self {
            load_cache_duration: secs_from_env(
                "CACHE_LOAD_DURATION_SECS",
                DEFAULT_LOAD_CACHE_DURATION_SECS,
            ),
            save_cache_duration: secs_from_env(
                "CACHE_SAVE_DURATION_SECS",
                DEFAULT_SAVE_CACHE_DURATION_SECS,
            ),
            purge_interval: secs_from_env("CACHE_PURGE_INTERVAL_SECS", DEFAULT_PURGE_INTERVAL_SECS),
        }
    }

    /// Checks that every duration is strictly positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("load_cache_duration", self.load_cache_duration),
            ("save_cache_duration", self.save_cache_duration),
            ("purge_interval", self.purge_interval),
        ];
        for (name, value) in fields {
            if value <= Duration::zero() {
                return Err(CacheError::invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            load_cache_duration: Duration::seconds(DEFAULT_LOAD_CACHE_DURATION_SECS),
            save_cache_duration: Duration::seconds(DEFAULT_SAVE_CACHE_DURATION_SECS),
            purge_interval: Duration::seconds(DEFAULT_PURGE_INTERVAL_SECS),
        }
    }
}

fn secs_from_env(name: &str, default: i64) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| Duration::seconds(default))
}
