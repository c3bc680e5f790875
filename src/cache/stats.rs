//! Cache Statistics Module
//!
//! Tracks hits, misses, hook calls and change notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::CacheChange;

// == Cache Stats ==
/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads that found a current entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Calls made to the load hook
    pub loads: u64,
    /// Calls made to the save hook
    pub saves: u64,
    pub created: u64,
    pub updated: u64,
    pub removed: u64,
    pub expired: u64,
    pub cleared: u64,
    /// Raw mapping count when the snapshot was taken
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by every caller of one cache.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    saves: AtomicU64,
    created: AtomicU64,
    updated: AtomicU64,
    removed: AtomicU64,
    expired: AtomicU64,
    cleared: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_change(&self, change: CacheChange) {
        let counter = match change {
            CacheChange::Cleared => &self.cleared,
            CacheChange::Created => &self.created,
            CacheChange::Updated => &self.updated,
            CacheChange::Removed => &self.removed,
            CacheChange::Expired => &self.expired,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            cleared: self.cleared.load(Ordering::Relaxed),
            total_entries,
        }
    }
}
