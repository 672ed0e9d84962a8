//! Chain tip height per pool, cached briefly.

use crate::{
    cache::{CacheTtl, SingleFlightTtlCache},
    config::{DaemonEndpoint, PoolConfig},
    types::{ChainFamily, METHOD_BLOCK_NUMBER},
    upstream::{is_loopback_host, Deadline, RpcGateway},
    utils::hex::decode_unsigned_as_u64,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::{trace, warn, Span};

/// Metrics label of the tip height cache.
pub const TIP_CACHE_NAME: &str = "tip_height";

/// Cached `eth_blockNumber` lookups keyed by pool id.
pub struct TipHeightService {
    gateway: RpcGateway,
    cache: Arc<SingleFlightTtlCache<String, u64>>,
    ttl: CacheTtl,
    timeout: Duration,
    span: Span,
}

impl TipHeightService {
    /// Creates the service. Values and failures are both cached for `ttl`.
    #[must_use]
    pub fn new(gateway: RpcGateway, ttl: Duration, timeout: Duration) -> Self {
        Self {
            gateway,
            cache: Arc::new(SingleFlightTtlCache::new(TIP_CACHE_NAME)),
            ttl: CacheTtl::uniform(ttl),
            timeout,
            span: tracing::info_span!("tip_height"),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<SingleFlightTtlCache<String, u64>> {
        &self.cache
    }

    /// Returns the current chain height for `pool`.
    ///
    /// Returns `None` without touching the cache if the pool is not an Ethereum
    /// pool, has no daemon, or its daemon is not on loopback.
    pub async fn get_chain_tip_height(&self, pool: &PoolConfig, deadline: Deadline) -> Option<u64> {
        if pool.family != ChainFamily::Ethereum {
            trace!(parent: &self.span, pool = %pool.id, family = %pool.family, "not an ethereum pool");
            return None;
        }

        let daemon = pool.preferred_daemon()?;
        if !is_loopback_host(&daemon.host) {
            warn!(parent: &self.span, pool = %pool.id, host = %daemon.host, "skipping eth_blockNumber, daemon host is not loopback");
            return None;
        }

        self.cache.get_or_fetch(pool.id.clone(), self.ttl, || self.fetch(daemon, deadline)).await
    }

    async fn fetch(&self, daemon: &DaemonEndpoint, deadline: Deadline) -> Option<u64> {
        let result = self.gateway.call(daemon, METHOD_BLOCK_NUMBER, json!([]), deadline, self.timeout).await?;

        let height = result.as_str().and_then(decode_unsigned_as_u64);
        if height.is_none() {
            warn!(parent: &self.span, result = %result, "eth_blockNumber returned an unparseable height");
        }
        height
    }
}
