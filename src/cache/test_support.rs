//! Shared hooks for the unit and property tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{Cache, CacheChange, CacheHooks, CacheUpdate};
use crate::error::{CacheError, Result};

pub type TestCache = Cache<String, i32, (), RecordingHooks>;

/// Loads from an in-memory source and records every hook call.
#[derive(Default)]
pub struct RecordingHooks {
    source: Mutex<HashMap<String, Arc<i32>>>,
    changes: Mutex<Vec<(CacheChange, Option<String>)>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    fail_updates: AtomicBool,
    fail_saves: AtomicBool,
    fail_keys: AtomicBool,
    update_delay_ms: AtomicU64,
    case_insensitive: bool,
}

impl RecordingHooks {
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    pub fn set_source(&self, key: &str, value: i32) {
        self.source.lock().insert(key.to_string(), Arc::new(value));
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::SeqCst);
    }

    /// Makes every update notification block the calling thread.
    pub fn delay_updates(&self, delay: Duration) {
        self.update_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn changes(&self) -> Vec<(CacheChange, Option<String>)> {
        self.changes.lock().clone()
    }

    pub fn last(&self) -> Option<(CacheChange, Option<String>)> {
        self.changes.lock().last().cloned()
    }

    pub fn last_change(&self) -> Option<CacheChange> {
        self.last().map(|(change, _)| change)
    }
}

impl CacheHooks<String, i32, ()> for RecordingHooks {
    fn on_get_key(&self, user_key: &String) -> Result<String> {
        if self.fail_keys.load(Ordering::SeqCst) {
            return Err(CacheError::hook("key normalization failed"));
        }
        if self.case_insensitive {
            Ok(user_key.to_lowercase())
        } else {
            Ok(user_key.clone())
        }
    }

    fn on_load(&self, user_key: &String, _user_param: &()) -> Result<Option<Arc<i32>>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.source.lock().get(user_key).cloned())
    }

    fn on_save(&self, _old_value: Option<&Arc<i32>>, _new_value: &Arc<i32>, _user_param: &()) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CacheError::hook("backing store rejected the write"));
        }
        Ok(())
    }

    fn on_update(&self, update: &CacheUpdate<'_, String, i32, ()>) -> Result<()> {
        let delay_ms = self.update_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            thread::sleep(Duration::from_millis(delay_ms));
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CacheError::hook("update listener rejected the change"));
        }
        self.changes
            .lock()
            .push((update.change, update.user_key.cloned()));
        Ok(())
    }
}
