//! Cache Store Module
//!
//! The map from normalized key to cache entry. The engine owns exactly one
//! store and only touches it through [`Guarded::locked`](super::Guarded::locked).

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;

// == Cache Store ==
/// Key/entry storage with no policy of its own.
#[derive(Debug)]
pub struct CacheStore<K, V, U> {
    /// Normalized key -> entry
    entries: HashMap<K, CacheEntry<K, V, U>>,
}

impl<K, V, U> Default for CacheStore<K, V, U> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V, U> CacheStore<K, V, U> {
    // == Get ==
    /// Looks up an entry without any expiry check.
    pub fn get(&self, cache_key: &K) -> Option<&CacheEntry<K, V, U>> {
        self.entries.get(cache_key)
    }

    // == Insert ==
    /// Stores an entry, returning the one it replaced.
    pub fn insert(
        &mut self,
        cache_key: K,
        entry: CacheEntry<K, V, U>,
    ) -> Option<CacheEntry<K, V, U>> {
        self.entries.insert(cache_key, entry)
    }

    // == Remove ==
    pub fn remove(&mut self, cache_key: &K) -> Option<CacheEntry<K, V, U>> {
        self.entries.remove(cache_key)
    }

    // == Drain Expired ==
    /// Removes and returns every entry that is stale at `now`.
    pub fn drain_expired(&mut self, now: DateTime<Utc>) -> Vec<CacheEntry<K, V, U>>
    where
        K: Clone,
    {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired_keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .collect()
    }

    // == Clear ==
    /// Drops every entry and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    // == Iterate ==
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<K, V, U>> {
        self.entries.values()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
