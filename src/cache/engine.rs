//! Cache Engine Module
//!
//! Read, write, remove, purge, clear and enumeration on top of a guarded
//! store. The store is locked only for map access; every hook runs after the
//! lock has been released.

use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::stats::StatsRecorder;
use crate::cache::{
    CacheChange, CacheEntry, CacheHooks, CacheStats, CacheStore, CacheUpdate, Guarded, LoadSave,
    NoHooks, DEFAULT_LOAD_CACHE_DURATION_SECS, DEFAULT_SAVE_CACHE_DURATION_SECS,
};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Expiry ==
/// Computes `now + duration`, capped one day short of the latest
/// representable instant.
///
/// Fails with [`CacheError::InvalidArgument`] when `duration` is not strictly
/// positive.
pub fn calculate_expiry(now: DateTime<Utc>, duration: Duration) -> Result<DateTime<Utc>> {
    if duration <= Duration::zero() {
        return Err(CacheError::invalid(format!(
            "cache duration must be positive, got {duration}"
        )));
    }
    let max_duration = (DateTime::<Utc>::MAX_UTC - now) - Duration::days(1);
    Ok(now + duration.min(max_duration))
}

// == Change Classification ==
/// Classifies the transition from `old_value` to `new_value`.
///
/// Returns `None` when both sides are the same handle (or both absent), in
/// which case nothing is reported.
pub fn classify<V>(
    old_value: Option<&Arc<V>>,
    new_value: Option<&Arc<V>>,
    expired: bool,
) -> Option<CacheChange> {
    match (old_value, new_value) {
        (None, None) => None,
        (Some(old), Some(new)) if Arc::ptr_eq(old, new) => None,
        (None, Some(_)) => Some(CacheChange::Created),
        (Some(_), Some(_)) => Some(CacheChange::Updated),
        (_, None) if expired => Some(CacheChange::Expired),
        (_, None) => Some(CacheChange::Removed),
    }
}

fn same_handle<V>(a: Option<&Arc<V>>, b: Option<&Arc<V>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Durations {
    load: Duration,
    save: Duration,
}

// == Cache ==
/// A thread-safe TTL cache with overridable hooks.
///
/// * `K` - caller key; the store is keyed by `on_get_key(K)`
/// * `V` - cached value, held as `Arc<V>` and compared by handle identity
/// * `U` - caller context stored with each entry and passed to the hooks
/// * `H` - the [`CacheHooks`] implementation
///
/// Share it between threads with `Arc<Cache<..>>`. Concurrent misses on the
/// same key each call `on_load`; the last write wins.
pub struct Cache<K, V, U = (), H = NoHooks> {
    state: Guarded<CacheStore<K, V, U>>,
    durations: RwLock<Durations>,
    hooks: H,
    clock: Arc<dyn Clock>,
    stats: StatsRecorder,
}

impl<K, V, U, H: Default> Default for Cache<K, V, U, H> {
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<K, V, U, H> Cache<K, V, U, H> {
    // == Constructor ==
    /// Creates an empty cache with the default durations (120s load, 10s save).
    pub fn new(hooks: H) -> Self {
        Self {
            state: Guarded::new(CacheStore::default()),
            durations: RwLock::new(Durations {
                load: Duration::seconds(DEFAULT_LOAD_CACHE_DURATION_SECS),
                save: Duration::seconds(DEFAULT_SAVE_CACHE_DURATION_SECS),
            }),
            hooks,
            clock: Arc::new(SystemClock),
            stats: StatsRecorder::default(),
        }
    }

    /// Creates an empty cache using the durations from `config`.
    pub fn with_config(config: &CacheConfig, hooks: H) -> Result<Self> {
        config.validate()?;
        let cache = Self::new(hooks);
        *cache.durations.write() = Durations {
            load: config.load_cache_duration,
            save: config.save_cache_duration,
        };
        Ok(cache)
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    // == Durations ==
    /// Lifetime given to entries created by a loading read.
    pub fn load_cache_duration(&self) -> Duration {
        self.durations.read().load
    }

    /// Lifetime given to entries written by `put` when no duration is passed.
    pub fn save_cache_duration(&self) -> Duration {
        self.durations.read().save
    }

    pub fn set_load_cache_duration(&self, duration: Duration) -> Result<()> {
        if duration <= Duration::zero() {
            return Err(CacheError::invalid("load_cache_duration must be positive"));
        }
        self.durations.write().load = duration;
        debug!(%duration, "load cache duration changed");
        Ok(())
    }

    pub fn set_save_cache_duration(&self, duration: Duration) -> Result<()> {
        if duration <= Duration::zero() {
            return Err(CacheError::invalid("save_cache_duration must be positive"));
        }
        self.durations.write().save = duration;
        debug!(%duration, "save cache duration changed");
        Ok(())
    }
}

impl<K, V, U, H> Cache<K, V, U, H>
where
    K: Eq + Hash + Clone,
    U: Clone + Default,
    H: CacheHooks<K, V, U>,
{
    // == Get ==
    /// Reads a value, loading it through `on_load` on a miss.
    pub fn get(&self, user_key: &K) -> Result<Option<Arc<V>>> {
        self.get_with(user_key, LoadSave::Default, U::default())
    }

    /// Reads a value with an explicit load policy and parameter.
    ///
    /// When a mapping is found, the parameter stored with it replaces
    /// `user_param` for the load and the notification.
    pub fn get_with(&self, user_key: &K, load: LoadSave, user_param: U) -> Result<Option<Arc<V>>> {
        let now = self.clock.now();
        let mut expires_at = calculate_expiry(now, self.load_cache_duration())?;
        let cache_key = self.hooks.on_get_key(user_key)?;

        let mut user_param = user_param;
        let mut old_value = None;
        let mut new_value = None;
        let mut current = false;
        let mut expired = false;
        self.state.locked(|store| {
            let Some(entry) = store.get(&cache_key) else {
                return;
            };
            user_param = entry.user_param.clone();
            old_value = Some(Arc::clone(&entry.value));
            if entry.is_expired_at(now) {
                store.remove(&cache_key);
                expired = true;
            } else {
                new_value = old_value.clone();
                current = true;
                // a refreshing read never shortens an entry
                expires_at = expires_at.max(entry.expires_at);
            }
        });

        if current {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        if expired {
            trace!("expired entry dropped on read");
        }

        if load.permits(!current) {
            self.stats.record_load();
            new_value = self.hooks.on_load(user_key, &user_param)?;
            let entry = new_value.as_ref().map(|value| {
                CacheEntry::new(
                    user_key.clone(),
                    Arc::clone(value),
                    user_param.clone(),
                    expires_at,
                )
            });
            self.state.locked(|store| match entry {
                Some(entry) => {
                    store.insert(cache_key, entry);
                }
                None => {
                    store.remove(&cache_key);
                }
            });
        }

        self.process_update(
            user_key,
            old_value.as_ref(),
            new_value.as_ref(),
            expired,
            &user_param,
        )?;
        Ok(new_value)
    }

    // == Put ==
    /// Writes a value for the save cache duration, saving it through
    /// `on_save` if the handle changed. Returns the previous value.
    pub fn put(&self, user_key: &K, value: Arc<V>) -> Result<Option<Arc<V>>> {
        self.put_with(
            user_key,
            value,
            LoadSave::Default,
            U::default(),
            self.save_cache_duration(),
        )
    }

    /// Writes a value with an explicit save policy, parameter and lifetime.
    pub fn put_with(
        &self,
        user_key: &K,
        value: Arc<V>,
        save: LoadSave,
        user_param: U,
        cache_duration: Duration,
    ) -> Result<Option<Arc<V>>> {
        let now = self.clock.now();
        let mut expires_at = calculate_expiry(now, cache_duration)?;
        let cache_key = self.hooks.on_get_key(user_key)?;

        let entry_param = user_param.clone();
        let (old_value, expired) = self.state.locked(|store| {
            let previous = store.get(&cache_key).map(|entry| {
                let expired = entry.is_expired_at(now);
                if !expired {
                    expires_at = expires_at.max(entry.expires_at);
                }
                (Arc::clone(&entry.value), expired)
            });
            store.insert(
                cache_key,
                CacheEntry::new(user_key.clone(), Arc::clone(&value), entry_param, expires_at),
            );
            match previous {
                Some((old_value, expired)) => (Some(old_value), expired),
                None => (None, false),
            }
        });

        if save.permits(!same_handle(Some(&value), old_value.as_ref())) {
            self.stats.record_save();
            self.hooks.on_save(old_value.as_ref(), &value, &user_param)?;
        }

        self.process_update(
            user_key,
            old_value.as_ref(),
            Some(&value),
            expired,
            &user_param,
        )?;
        Ok(old_value)
    }

    // == Remove ==
    /// Removes a key. Returns whether a mapping (current or expired) was present.
    pub fn remove(&self, user_key: &K) -> Result<bool> {
        self.remove_with(user_key, U::default())
    }

    pub fn remove_with(&self, user_key: &K, user_param: U) -> Result<bool> {
        let now = self.clock.now();
        let cache_key = self.hooks.on_get_key(user_key)?;

        let removed = self.state.locked(|store| store.remove(&cache_key));
        let found = removed.is_some();
        let (old_value, expired) = match removed {
            Some(entry) => {
                let expired = entry.is_expired_at(now);
                (Some(entry.value), expired)
            }
            None => (None, false),
        };

        self.process_update(user_key, old_value.as_ref(), None, expired, &user_param)?;
        Ok(found)
    }

    // == Purge ==
    /// Drops every expired entry and reports each one as
    /// [`CacheChange::Expired`]. Returns the number dropped.
    pub fn purge(&self) -> Result<usize> {
        let now = self.clock.now();
        let purged = self.state.locked(|store| store.drain_expired(now));
        debug!(count = purged.len(), "purged expired entries");

        for entry in &purged {
            self.notify(CacheUpdate {
                change: CacheChange::Expired,
                user_key: Some(&entry.user_key),
                old_value: Some(&entry.value),
                new_value: None,
                user_param: Some(&entry.user_param),
            })?;
        }
        Ok(purged.len())
    }

    // == Clear ==
    /// Drops every entry, current or expired, and fires a single
    /// [`CacheChange::Cleared`].
    pub fn clear(&self) -> Result<()> {
        let dropped = self.state.locked(|store| store.clear());
        debug!(dropped, "cache cleared");

        self.notify(CacheUpdate {
            change: CacheChange::Cleared,
            user_key: None,
            old_value: None,
            new_value: None,
            user_param: None,
        })
    }

    // == Enumeration ==
    /// Reads every cached key through [`get_with`](Self::get_with), so
    /// expired entries are reloaded or dropped. Not an atomic snapshot.
    pub fn get_values(&self) -> Result<Vec<Arc<V>>> {
        self.get_values_with(LoadSave::Default)
    }

    pub fn get_values_with(&self, load: LoadSave) -> Result<Vec<Arc<V>>> {
        let items: Vec<(K, U)> = self.state.locked(|store| {
            store
                .entries()
                .map(|entry| (entry.user_key.clone(), entry.user_param.clone()))
                .collect()
        });

        let mut values = Vec::with_capacity(items.len());
        for (user_key, user_param) in items {
            if let Some(value) = self.get_with(&user_key, load, user_param)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Keys of every mapping, expired or not. Does not reload anything.
    pub fn get_keys(&self) -> Vec<K> {
        self.state.locked(|store| {
            store
                .entries()
                .map(|entry| entry.user_key.clone())
                .collect()
        })
    }

    /// Raw copies of every entry, expired ones included.
    pub fn get_cache_items(&self) -> Vec<CacheEntry<K, V, U>> {
        self.state
            .locked(|store| store.entries().cloned().collect())
    }

    // == Length ==
    /// Number of mappings, expired ones included.
    pub fn len(&self) -> usize {
        self.state.locked(|store| store.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    fn process_update(
        &self,
        user_key: &K,
        old_value: Option<&Arc<V>>,
        new_value: Option<&Arc<V>>,
        expired: bool,
        user_param: &U,
    ) -> Result<()> {
        let Some(change) = classify(old_value, new_value, expired) else {
            return Ok(());
        };
        self.notify(CacheUpdate {
            change,
            user_key: Some(user_key),
            old_value,
            new_value,
            user_param: Some(user_param),
        })
    }

    fn notify(&self, update: CacheUpdate<'_, K, V, U>) -> Result<()> {
        self.stats.record_change(update.change);
        self.hooks.on_update(&update)
    }
}
