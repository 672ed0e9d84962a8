//! Batch enrichment of pool blocks.
//!
//! ```text
//! enrich(pool, blocks)
//!       │
//!       ├── not ethereum / no blocks / no daemon ──► no-op
//!       ├── daemon not on loopback ──► warn, no-op
//!       ▼
//!  heights ∪ predecessors ──► one metadata lookup per height (concurrent)
//!       │
//!       ▼
//!  merge onto each block, derive block time from predecessor timestamp
//! ```
//!
//! Neither entry point returns an error or lets a panic escape. The worst case
//! for a caller is blocks left as they were.

use crate::{
    cache::{background, CacheStats},
    config::{DaemonEndpoint, PoolConfig},
    enrichment::{
        metadata::{BlockMetadata, BlockMetadataService},
        tip::TipHeightService,
    },
    metrics,
    types::{Block, ChainFamily},
    upstream::{is_loopback_host, Deadline},
};
use chrono::{DateTime, Utc};
use futures::{future::join_all, FutureExt};
use std::{
    any::Any,
    collections::{BTreeSet, HashMap},
    future::Future,
    panic::AssertUnwindSafe,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, trace, warn, Span};

/// Counters of both enrichment caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub tip: CacheStats,
    pub blocks: CacheStats,
}

/// Fills block records with metadata from the pool's node.
///
/// Built with [`BlockEnricherBuilder`](crate::enrichment::BlockEnricherBuilder).
pub struct BlockEnricher {
    tip: TipHeightService,
    metadata: BlockMetadataService,
    sweep_interval: Option<Duration>,
    span: Span,
}

impl BlockEnricher {
    pub(crate) fn new(
        tip: TipHeightService,
        metadata: BlockMetadataService,
        sweep_interval: Option<Duration>,
        span: Span,
    ) -> Self {
        Self { tip, metadata, sweep_interval, span }
    }

    /// Enriches `blocks` in place with metadata from `pool`'s node.
    ///
    /// Each block receives the metadata of its own height. Block time is set
    /// when both the block and its predecessor have a timestamp and the
    /// difference is non-negative. Lookups that fail leave their blocks'
    /// fields empty; other blocks are still enriched.
    pub async fn enrich(&self, pool: &PoolConfig, blocks: &mut [Block], deadline: Deadline) {
        self.enrich_with(pool, blocks, |daemon, height| self.metadata.get_block_metadata(daemon, height, deadline))
            .await;
    }

    /// Runs [`enrich`](Self::enrich) with `lookup` resolving each height.
    pub(crate) async fn enrich_with<'a, F, Fut>(&self, pool: &'a PoolConfig, blocks: &mut [Block], lookup: F)
    where
        F: Fn(&'a DaemonEndpoint, u64) -> Fut,
        Fut: Future<Output = Arc<BlockMetadata>>,
    {
        if pool.family != ChainFamily::Ethereum || blocks.is_empty() {
            trace!(parent: &self.span, pool = %pool.id, family = %pool.family, blocks = blocks.len(), "nothing to enrich");
            return;
        }

        let Some(daemon) = pool.preferred_daemon() else {
            debug!(parent: &self.span, pool = %pool.id, "no daemon configured, skipping enrichment");
            return;
        };

        if !is_loopback_host(&daemon.host) {
            warn!(parent: &self.span, pool = %pool.id, host = %daemon.host, "skipping block enrichment, daemon host is not loopback");
            return;
        }

        let started = Instant::now();
        let heights = required_heights(blocks);

        let lookups = match AssertUnwindSafe(fetch_all(daemon, &heights, &lookup)).catch_unwind().await {
            Ok(lookups) => lookups,
            Err(panic) => {
                error!(parent: &self.span, pool = %pool.id, panic = panic_message(&*panic), "block enrichment aborted");
                return;
            }
        };

        for block in blocks.iter_mut() {
            apply_metadata(block, &lookups);
        }

        debug!(parent: &self.span, pool = %pool.id, blocks = blocks.len(), heights = heights.len(), "enriched blocks");
        metrics::record_enrichment(&pool.id, blocks.len(), started.elapsed());
    }

    /// Returns the current chain height for `pool`, cached briefly.
    ///
    /// `None` for non-Ethereum pools, untrusted daemons and failed lookups.
    pub async fn chain_tip_height(&self, pool: &PoolConfig, deadline: Deadline) -> Option<u64> {
        self.guard_tip(pool, self.tip.get_chain_tip_height(pool, deadline)).await
    }

    async fn guard_tip(&self, pool: &PoolConfig, lookup: impl Future<Output = Option<u64>>) -> Option<u64> {
        match AssertUnwindSafe(lookup).catch_unwind().await {
            Ok(height) => height,
            Err(panic) => {
                error!(parent: &self.span, pool = %pool.id, panic = panic_message(&*panic), "chain tip lookup aborted");
                None
            }
        }
    }

    /// Returns the counters of both caches.
    #[must_use]
    pub fn stats(&self) -> EnrichmentStats {
        EnrichmentStats { tip: self.tip.cache().stats(), blocks: self.metadata.cache().stats() }
    }

    /// Spawns the expiry sweep for both caches if one is configured.
    ///
    /// The tasks stop when `shutdown` fires.
    pub fn spawn_expiry_sweeps(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        let Some(interval) = self.sweep_interval else {
            debug!(parent: &self.span, "cache expiry sweep disabled");
            return Vec::new();
        };

        vec![
            background::spawn_expiry_sweep(Arc::clone(self.tip.cache()), interval, shutdown.subscribe()),
            background::spawn_expiry_sweep(Arc::clone(self.metadata.cache()), interval, shutdown.subscribe()),
        ]
    }
}

async fn fetch_all<'a, F, Fut>(
    daemon: &'a DaemonEndpoint,
    heights: &BTreeSet<u64>,
    lookup: &F,
) -> HashMap<u64, Arc<BlockMetadata>>
where
    F: Fn(&'a DaemonEndpoint, u64) -> Fut,
    Fut: Future<Output = Arc<BlockMetadata>>,
{
    let lookups = heights.iter().map(|&height| {
        let metadata = lookup(daemon, height);
        async move { (height, metadata.await) }
    });

    join_all(lookups).await.into_iter().collect()
}

/// Heights of `blocks` plus the predecessor of each non-genesis height.
pub(crate) fn required_heights(blocks: &[Block]) -> BTreeSet<u64> {
    let mut heights = BTreeSet::new();
    for block in blocks {
        heights.insert(block.block_height);
        if let Some(previous) = block.block_height.checked_sub(1) {
            heights.insert(previous);
        }
    }
    heights
}

/// Copies the metadata of `block`'s height onto it and derives its block time.
///
/// Scalar fields are overwritten, so a failed lookup clears them.
/// `block_time_seconds` is only ever set, never cleared.
pub(crate) fn apply_metadata(block: &mut Block, lookups: &HashMap<u64, Arc<BlockMetadata>>) {
    let Some(current) = lookups.get(&block.block_height) else {
        return;
    };

    block.block_difficulty = current.difficulty;
    block.block_timestamp = current.timestamp;
    block.tx_count = current.tx_count;
    block.block_miner.clone_from(&current.miner);
    block.gas_used = current.gas_used;
    block.gas_limit = current.gas_limit;
    block.base_fee_per_gas = current.base_fee_per_gas;
    block.block_size_bytes = current.size_bytes;

    let previous = block.block_height.checked_sub(1).and_then(|height| lookups.get(&height));
    if let Some(seconds) = previous.and_then(|previous| block_time(previous.timestamp, current.timestamp)) {
        block.block_time_seconds = Some(seconds);
    }
}

/// Seconds between two block timestamps, if both exist and they are in order.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn block_time(previous: Option<DateTime<Utc>>, current: Option<DateTime<Utc>>) -> Option<f64> {
    let delta = (current? - previous?).num_milliseconds() as f64 / 1000.0;
    (delta >= 0.0 && delta.is_finite()).then_some(delta)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return message;
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return message.as_str();
    }
    "unknown panic"
}
