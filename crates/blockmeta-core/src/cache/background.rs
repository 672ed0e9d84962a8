//! Periodic sweep of expired cache entries.
//!
//! Expired entries are already replaced lazily on access. The sweep only
//! bounds memory for keys that are never looked up again, such as old block
//! heights.

use crate::cache::SingleFlightTtlCache;
use std::{hash::Hash, sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info};

/// Removes expired entries from `cache` every `interval` until shutdown.
///
/// # Arguments
/// * `cache` - cache to sweep
/// * `interval` - time between sweeps; the first sweep runs one interval after start
/// * `shutdown_rx` - broadcast receiver for the shutdown signal
pub async fn run_expiry_sweep<K, V>(
    cache: Arc<SingleFlightTtlCache<K, V>>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    K: Eq + Hash + Clone,
    V: Clone,
{
    info!(cache = cache.name(), interval_secs = interval.as_secs(), "starting cache expiry sweep");

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(cache = cache.name(), removed, remaining = cache.len(), "swept expired cache entries");
                }
            }
            _ = shutdown_rx.recv() => {
                debug!(cache = cache.name(), "cache expiry sweep shutting down");
                break;
            }
        }
    }
}

/// Spawns [`run_expiry_sweep`] on the current runtime.
pub fn spawn_expiry_sweep<K, V>(
    cache: Arc<SingleFlightTtlCache<K, V>>,
    interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(run_expiry_sweep(cache, interval, shutdown_rx))
}
