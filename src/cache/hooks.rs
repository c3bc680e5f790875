//! Extension Hooks Module
//!
//! Policy points the engine calls outside its lock: key normalization,
//! load-on-miss, write-through and change notification.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;

// == Load/Save Policy ==
/// Whether a read may load, or a write may save, through the hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSave {
    /// Load on miss or expiry; save when the stored handle changes
    #[default]
    Default,
    /// Never call the hook
    Avoid,
    /// Always call the hook
    Force,
}

impl LoadSave {
    /// Decides whether the hook runs, given whether the default rule wants it.
    pub(crate) fn permits(self, needed: bool) -> bool {
        match self {
            LoadSave::Default => needed,
            LoadSave::Avoid => false,
            LoadSave::Force => true,
        }
    }
}

// == Cache Change ==
/// Classification of a cache state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheChange {
    /// Every entry was dropped at once
    Cleared,
    /// A value appeared where there was none
    Created,
    /// A value was replaced by a different handle
    Updated,
    /// A value was removed explicitly or by a load that found nothing
    Removed,
    /// A value was dropped because its entry had expired
    Expired,
}

// == Cache Update ==
/// Everything `on_update` gets to see about a transition.
///
/// For [`CacheChange::Cleared`] the key, values and parameter are all `None`.
#[derive(Debug)]
pub struct CacheUpdate<'a, K, V, U> {
    pub change: CacheChange,
    pub user_key: Option<&'a K>,
    pub old_value: Option<&'a Arc<V>>,
    pub new_value: Option<&'a Arc<V>>,
    pub user_param: Option<&'a U>,
}

// == Hooks Trait ==
/// Overridable behaviour of a [`Cache`](super::Cache).
///
/// Every method has a default, so an implementation only overrides what it
/// needs. Errors returned here surface unchanged from the cache operation
/// that called the hook.
pub trait CacheHooks<K: Clone, V, U> {
    /// Maps a caller key to the key used in the store (identity by default).
    fn on_get_key(&self, user_key: &K) -> Result<K> {
        Ok(user_key.clone())
    }

    /// Produces a value for a missing, expired or force-loaded key.
    fn on_load(&self, _user_key: &K, _user_param: &U) -> Result<Option<Arc<V>>> {
        Ok(None)
    }

    /// Writes a changed value through to a backing store.
    fn on_save(&self, _old_value: Option<&Arc<V>>, _new_value: &Arc<V>, _user_param: &U) -> Result<()> {
        Ok(())
    }

    /// Reacts to a classified state transition.
    fn on_update(&self, _update: &CacheUpdate<'_, K, V, U>) -> Result<()> {
        Ok(())
    }
}

// == No Hooks ==
/// A cache with no backing source: misses stay misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<K: Clone, V, U> CacheHooks<K, V, U> for NoHooks {}

// == Loader ==
/// Uses a closure as the load hook and keeps every other default.
pub struct Loader<F, K, V, U> {
    load: F,
    _marker: PhantomData<fn(&K, &U) -> V>,
}

impl<F, K, V, U> Loader<F, K, V, U>
where
    F: Fn(&K, &U) -> Result<Option<Arc<V>>>,
{
    pub fn new(load: F) -> Self {
        Self {
            load,
            _marker: PhantomData,
        }
    }
}

impl<F, K, V, U> CacheHooks<K, V, U> for Loader<F, K, V, U>
where
    K: Clone,
    F: Fn(&K, &U) -> Result<Option<Arc<V>>>,
{
    fn on_load(&self, user_key: &K, user_param: &U) -> Result<Option<Arc<V>>> {
        (self.load)(user_key, user_param)
    }
}
