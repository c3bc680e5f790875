//! Property-Based Tests for Cache Module
//!
//! Uses proptest with a manual clock so expiry can be checked exactly.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use crate::cache::test_support::{RecordingHooks, TestCache};
use crate::cache::{classify, CacheChange, LoadSave};
use crate::clock::{Clock, ManualClock};

// == Strategies ==
fn policy_strategy() -> impl Strategy<Value = LoadSave> {
    prop_oneof![
        Just(LoadSave::Default),
        Just(LoadSave::Avoid),
        Just(LoadSave::Force),
    ]
}

/// How the new handle relates to the old one
#[derive(Debug, Clone, Copy)]
enum NewSide {
    Absent,
    SameHandle,
    OtherHandle,
}

fn new_side_strategy() -> impl Strategy<Value = NewSide> {
    prop_oneof![
        Just(NewSide::Absent),
        Just(NewSide::SameHandle),
        Just(NewSide::OtherHandle),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { secs: i64, save: LoadSave },
    Get { load: LoadSave },
    Advance { millis: i64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (1i64..300, policy_strategy()).prop_map(|(secs, save)| CacheOp::Put { secs, save }),
        policy_strategy().prop_map(|load| CacheOp::Get { load }),
        (0i64..200_000).prop_map(|millis| CacheOp::Advance { millis }),
    ]
}

fn test_cache() -> (TestCache, ManualClock) {
    let clock = ManualClock::default();
    let cache = TestCache::new(RecordingHooks::default()).with_clock(clock.clone());
    (cache, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // **Property 1: Classification Correctness**
    // *For any* (old, new, expired) triple, the change reported matches the
    // table, and an unchanged handle reports nothing.
    #[test]
    fn prop_classification_table(
        old_present in any::<bool>(),
        new_side in new_side_strategy(),
        expired in any::<bool>()
    ) {
        let old = old_present.then(|| Arc::new(1));
        let new = match new_side {
            NewSide::Absent => None,
            NewSide::SameHandle => old.clone(),
            NewSide::OtherHandle => Some(Arc::new(1)),
        };

        let expected = match (&old, &new) {
            (None, None) => None,
            (Some(o), Some(n)) if Arc::ptr_eq(o, n) => None,
            (None, Some(_)) => Some(CacheChange::Created),
            (Some(_), Some(_)) => Some(CacheChange::Updated),
            (Some(_), None) if expired => Some(CacheChange::Expired),
            (Some(_), None) => Some(CacheChange::Removed),
        };

        prop_assert_eq!(classify(old.as_ref(), new.as_ref(), expired), expected);
    }

    // **Property 2: Expiry Monotonicity**
    // *For any* sequence of reads and writes on one key, a current entry's
    // expiry never moves earlier.
    #[test]
    fn prop_expiry_monotonicity(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let (cache, clock) = test_cache();
        let key = "k".to_string();
        cache.hooks().set_source("k", 7);

        for op in ops {
            let before = cache.get_cache_items().first().map(|e| e.expires_at);
            let now = clock.now();

            match op {
                CacheOp::Put { secs, save } => {
                    cache.put_with(&key, Arc::new(1), save, (), Duration::seconds(secs)).unwrap();
                }
                CacheOp::Get { load } => {
                    cache.get_with(&key, load, ()).unwrap();
                }
                CacheOp::Advance { millis } => {
                    clock.advance(Duration::milliseconds(millis));
                    continue;
                }
            }

            let after = cache.get_cache_items().first().map(|e| e.expires_at);
            if let (Some(before), Some(after)) = (before, after) {
                if now <= before {
                    prop_assert!(after >= before, "expiry shortened from {} to {}", before, after);
                }
            }
        }
    }

    // **Property 3: No Premature Expiry**
    // *For any* entry written with duration D, a read at t <= D returns the
    // same handle and a read at t > D finds it stale.
    #[test]
    fn prop_no_premature_expiry(secs in 1i64..3600, fraction in 0.0f64..=1.0) {
        let (cache, clock) = test_cache();
        let key = "k".to_string();
        let value = Arc::new(3);
        let duration = Duration::seconds(secs);
        cache.put_with(&key, Arc::clone(&value), LoadSave::Default, (), duration).unwrap();

        let elapsed = Duration::milliseconds((secs as f64 * 1000.0 * fraction) as i64);
        clock.advance(elapsed);
        let read = cache.get_with(&key, LoadSave::Avoid, ()).unwrap();
        prop_assert!(read.map_or(false, |v| Arc::ptr_eq(&v, &value)));

        clock.advance(duration - elapsed + Duration::milliseconds(1));
        prop_assert!(cache.get_with(&key, LoadSave::Avoid, ()).unwrap().is_none());
        prop_assert_eq!(cache.hooks().last_change(), Some(CacheChange::Expired));
    }

    // **Property 4: Purge Only Expired**
    // *For any* set of entries and elapsed time, purge removes exactly the
    // entries whose expiry has passed.
    #[test]
    fn prop_purge_only_expired(
        durations in prop::collection::vec(1i64..100, 1..20),
        elapsed in 0i64..120
    ) {
        let (cache, clock) = test_cache();
        for (i, secs) in durations.iter().enumerate() {
            cache
                .put_with(&format!("k{i}"), Arc::new(i as i32), LoadSave::Avoid, (), Duration::seconds(*secs))
                .unwrap();
        }

        clock.advance(Duration::seconds(elapsed));
        let purged = cache.purge().unwrap();

        let expected: HashSet<String> = durations
            .iter()
            .enumerate()
            .filter(|(_, secs)| **secs >= elapsed)
            .map(|(i, _)| format!("k{i}"))
            .collect();
        let remaining: HashSet<String> = cache.get_keys().into_iter().collect();

        prop_assert_eq!(purged, durations.len() - expected.len());
        prop_assert_eq!(remaining, expected);
    }

    // **Property 5: Load And Save Suppression**
    // *For any* sequence of operations under `Avoid`, neither the load hook
    // nor the save hook runs.
    #[test]
    fn prop_avoid_suppresses_hooks(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let (cache, clock) = test_cache();
        let key = "k".to_string();
        cache.hooks().set_source("k", 7);

        for op in ops {
            match op {
                CacheOp::Put { secs, .. } => {
                    cache.put_with(&key, Arc::new(1), LoadSave::Avoid, (), Duration::seconds(secs)).unwrap();
                }
                CacheOp::Get { .. } => {
                    cache.get_with(&key, LoadSave::Avoid, ()).unwrap();
                }
                CacheOp::Advance { millis } => clock.advance(Duration::milliseconds(millis)),
            }
        }

        prop_assert_eq!(cache.hooks().load_count(), 0);
        prop_assert_eq!(cache.hooks().save_count(), 0);
    }

    // **Property 6: Force Always Loads**
    // *For any* number of forced reads, the load hook runs once per read,
    // whether or not a current entry exists.
    #[test]
    fn prop_force_always_loads(reads in 1usize..20, seed_first in any::<bool>()) {
        let (cache, _clock) = test_cache();
        let key = "k".to_string();
        cache.hooks().set_source("k", 7);
        if seed_first {
            cache.put(&key, Arc::new(1)).unwrap();
        }

        for _ in 0..reads {
            prop_assert!(cache.get_with(&key, LoadSave::Force, ()).unwrap().is_some());
        }

        prop_assert_eq!(cache.hooks().load_count(), reads);
    }
}
