//! Purge Task
//!
//! Background task that periodically drops expired cache entries.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheHooks};

/// Spawns a background task that calls [`Cache::purge`] every `interval`.
///
/// Reads already drop expired entries lazily; this task reclaims entries
/// that are never read again and fires their `Expired` notifications.
/// Each sweep runs on the blocking thread pool because update hooks may
/// block. A failing update hook is logged and the loop carries on.
///
/// The returned handle aborts the task.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::<String, String>::default());
/// let purge_handle = spawn_purge_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task<K, V, U, H>(cache: Arc<Cache<K, V, U, H>>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    U: Clone + Default + Send + Sync + 'static,
    H: CacheHooks<K, V, U> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting cache purge task");

        loop {
            tokio::time::sleep(interval).await;

            // Hooks may block, so the sweep runs off the async workers
            let sweep = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || sweep.purge()).await {
                Ok(Ok(0)) => debug!("Cache purge: no expired entries found"),
                Ok(Ok(removed)) => info!("Cache purge: removed {} expired entries", removed),
                Ok(Err(err)) => warn!(error = %err, "Cache purge: update hook failed"),
                Err(err) => warn!(error = %err, "Cache purge: sweep did not complete"),
            }
        }
    })
}
