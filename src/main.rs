//! TTL Cache demo
//!
//! Drives a cache backed by a slow source from several worker threads, runs
//! the background purge, and prints the final statistics as JSON.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::{spawn_purge_task, Cache, CacheConfig, CacheHooks, CacheUpdate, LoadSave};

const WORKERS: usize = 4;
const ROUNDS: usize = 25;
const KEYS: [&str; 5] = ["EUR-OIS", "USD-SOFR", "GBP-SONIA", "JPY-TONA", "CHF-SARON"];

/// Simulated backing store with noticeable load latency.
#[derive(Default)]
struct SlowSource {
    generation: AtomicU64,
}

impl CacheHooks<String, String, ()> for SlowSource {
    fn on_get_key(&self, user_key: &String) -> ttl_cache::Result<String> {
        Ok(user_key.to_lowercase())
    }

    fn on_load(&self, user_key: &String, _user_param: &()) -> ttl_cache::Result<Option<Arc<String>>> {
        std::thread::sleep(Duration::from_millis(20));
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        Ok(Some(Arc::new(format!("{user_key}#{generation}"))))
    }

    fn on_update(&self, update: &CacheUpdate<'_, String, String, ()>) -> ttl_cache::Result<()> {
        info!(
            change = ?update.change,
            key = update.user_key.map(String::as_str).unwrap_or("-"),
            "cache changed"
        );
        Ok(())
    }
}

/// Entry point for the cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and start the background purge task
/// 4. Run the worker threads
/// 5. Log remaining lifetimes, print statistics and stop the purge task
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    config.validate().context("invalid cache configuration")?;
    info!(
        "Configuration loaded: load_cache_duration={}, save_cache_duration={}, purge_interval={}",
        config.load_cache_duration, config.save_cache_duration, config.purge_interval
    );

    let cache: Arc<Cache<String, String, (), SlowSource>> =
        Arc::new(Cache::with_config(&config, SlowSource::default())?);
    let purge_interval = config
        .purge_interval
        .to_std()
        .context("purge interval out of range")?;
    let purge_handle = spawn_purge_task(cache.clone(), purge_interval);

    let workers: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let cache = cache.clone();
            tokio::task::spawn_blocking(move || -> ttl_cache::Result<()> {
                for round in 0..ROUNDS {
                    let key = KEYS[(worker + round) % KEYS.len()].to_string();
                    if round % 10 == 9 {
                        cache.get_with(&key, LoadSave::Force, ())?;
                    } else {
                        cache.get(&key)?;
                    }
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker.await.context("worker panicked")??;
    }

    let values = cache.get_values_with(LoadSave::Avoid)?;
    info!("{} values cached", values.len());

    let now = chrono::Utc::now();
    for entry in cache.get_cache_items() {
        info!(
            key = entry.user_key.as_str(),
            ttl_ms = entry.ttl_remaining_at(now).num_milliseconds(),
            "cached entry"
        );
    }

    let stats = cache.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    purge_handle.abort();
    info!("Purge task aborted");
    Ok(())
}
