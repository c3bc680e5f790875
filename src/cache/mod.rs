//! Cache Module
//!
//! Thread-safe TTL cache with load, save, key and change-notification hooks.

mod engine;
mod entry;
mod guarded;
mod hooks;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
pub(crate) mod test_support;

// Re-export public types
pub use engine::{calculate_expiry, classify, Cache};
pub use entry::CacheEntry;
pub use guarded::Guarded;
pub use hooks::{CacheChange, CacheHooks, CacheUpdate, LoadSave, Loader, NoHooks};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default lifetime of entries created by a loading read, in seconds
pub const DEFAULT_LOAD_CACHE_DURATION_SECS: i64 = 120;

/// Default lifetime of entries written by `put`, in seconds
pub const DEFAULT_SAVE_CACHE_DURATION_SECS: i64 = 10;
