//! Cache Entry Module
//!
//! Defines the immutable record stored for each cached key.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

// == Cache Entry ==
/// A cached value together with the key and parameter it was stored under.
///
/// Entries are never mutated. A refreshing read or a write produces a new
/// entry that replaces the old one in the store.
#[derive(Debug)]
pub struct CacheEntry<K, V, U> {
    /// The key as supplied by the caller, before normalization
    pub user_key: K,
    /// The cached value, compared by handle identity
    pub value: Arc<V>,
    /// Caller context threaded through to the hooks
    pub user_param: U,
    /// Instant after which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl<K, V, U> CacheEntry<K, V, U> {
    // == Constructor ==
    pub fn new(user_key: K, value: Arc<V>, user_param: U, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_key,
            value,
            user_param,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// An entry is still current at exactly its expiry instant and stale
    /// strictly after it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

// Manual impl: `V` itself need not be Clone, only the handle is copied.
impl<K: Clone, V, U: Clone> Clone for CacheEntry<K, V, U> {
    fn clone(&self) -> Self {
        Self {
            user_key: self.user_key.clone(),
            value: Arc::clone(&self.value),
            user_param: self.user_param.clone(),
            expires_at: self.expires_at,
        }
    }
}
