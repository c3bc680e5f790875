//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

/// Boxed error raised by a hook implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for cache operations and hooks.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A duration or configuration value is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A load, save, key or update hook failed
    #[error("Hook failed: {0}")]
    Hook(#[source] BoxError),
}

impl CacheError {
    /// Wraps any error raised inside a hook implementation.
    pub fn hook(err: impl Into<BoxError>) -> Self {
        CacheError::Hook(err.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CacheError::InvalidArgument(msg.into())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
