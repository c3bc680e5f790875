//! TTL Cache - a thread-safe keyed cache with pluggable hooks
//!
//! Entries expire after a configurable lifetime. Misses can be loaded from a
//! backing source, writes can be saved through to it, keys can be normalized
//! and every state change can be observed, all by implementing
//! [`CacheHooks`].

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheChange, CacheEntry, CacheHooks, CacheStats, CacheUpdate, LoadSave};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_purge_task;
