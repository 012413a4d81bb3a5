//! Statistics Reporter Task
//!
//! Background task that periodically logs the cache statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::CacheManager;

/// Spawns a background task that logs a statistics snapshot every
/// `interval_secs` seconds.
///
/// Taking the snapshot sweeps expired entries, so the reported size is
/// current. Returns a JoinHandle that can be aborted on shutdown.
///
/// # Example
/// ```ignore
/// let state = AppState::from_config(&config);
/// let reporter = spawn_stats_reporter(state.manager.clone(), 30);
/// // Later, during shutdown:
/// reporter.abort();
/// ```
pub fn spawn_stats_reporter(
    manager: Arc<Mutex<CacheManager>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let stats = {
                let mut guard = manager.lock().await;
                guard.statistics()
            };

            info!(
                hits = stats.hits,
                misses = stats.misses,
                hit_rate = stats.hit_rate(),
                invalidations = stats.invalidations,
                manual_evicts = stats.manual_evicts,
                expirations = stats.expirations,
                should_cache_true = stats.should_cache_true,
                should_cache_false = stats.should_cache_false,
                cache_size = stats.cache_size,
                "Cache statistics"
            );
        }
    })
}
