//! Block metadata lookups by height.
//!
//! A daemon reply to `eth_getBlockByNumber` is decoded field by field into a
//! [`BlockMetadata`]. Each field is decoded on its own; a missing or malformed
//! field leaves only that field empty.

use crate::{
    cache::{CacheTtl, SingleFlightTtlCache},
    config::DaemonEndpoint,
    types::METHOD_GET_BLOCK_BY_NUMBER,
    upstream::{Deadline, RpcGateway},
    utils::hex::{decode_unsigned_as_f64, decode_unsigned_as_i64, format_hex_u64},
};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn, Span};

/// Metrics label of the block metadata cache.
pub const BLOCK_CACHE_NAME: &str = "block_metadata";

/// Decoded snapshot of one block as reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockMetadata {
    pub difficulty: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub tx_count: Option<u64>,
    pub miner: Option<String>,
    pub gas_used: Option<u64>,
    pub gas_limit: Option<u64>,
    pub base_fee_per_gas: Option<u64>,
    pub size_bytes: Option<u64>,
}

impl BlockMetadata {
    /// Metadata with every field empty. Stands in for an absent lookup.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Decodes a block object from an `eth_getBlockByNumber` result.
    ///
    /// Returns `None` if `block` is not a JSON object.
    ///
    /// - `difficulty`: unsigned hex of any width, kept only if finite as `f64`
    /// - `timestamp`: unix seconds, within `i64` and the range `chrono` can represent
    /// - `transactions`: the array length, without inspecting its items
    /// - `miner`: passed through as-is
    /// - `gasUsed`, `gasLimit`, `baseFeePerGas`, `size`: unsigned hex within `i64`
    #[must_use]
    pub fn from_rpc_block(block: &Value) -> Option<Self> {
        let block = block.as_object()?;

        Some(Self {
            difficulty: str_field(block, "difficulty").and_then(decode_unsigned_as_f64),
            timestamp: str_field(block, "timestamp").and_then(decode_timestamp),
            tx_count: block.get("transactions").and_then(Value::as_array).map(|txs| txs.len() as u64),
            miner: str_field(block, "miner").map(str::to_owned),
            gas_used: str_field(block, "gasUsed").and_then(decode_i64_range),
            gas_limit: str_field(block, "gasLimit").and_then(decode_i64_range),
            base_fee_per_gas: str_field(block, "baseFeePerGas").and_then(decode_i64_range),
            size_bytes: str_field(block, "size").and_then(decode_i64_range),
        })
    }
}

fn str_field<'a>(block: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    block.get(name).and_then(Value::as_str)
}

fn decode_i64_range(value: &str) -> Option<u64> {
    decode_unsigned_as_i64(value).and_then(|v| u64::try_from(v).ok())
}

fn decode_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let seconds = decode_unsigned_as_i64(value)?;
    DateTime::from_timestamp(seconds, 0)
}

/// Cache key for block metadata: a height on one daemon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    endpoint: Arc<str>,
    height: u64,
}

impl BlockKey {
    /// Keys `height` by the daemon's RPC URL, so equivalent spellings of one
    /// host (`::1` and `[::1]`) share entries.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the endpoint does not form a valid URL.
    pub fn new(endpoint: &DaemonEndpoint, height: u64) -> Result<Self, url::ParseError> {
        let url = endpoint.rpc_url()?;
        Ok(Self { endpoint: Arc::from(url.as_str()), height })
    }

    #[must_use]
    pub fn height(&self) -> u64 {
        self.height
    }
}

/// Cached `eth_getBlockByNumber` lookups.
pub struct BlockMetadataService {
    gateway: RpcGateway,
    cache: Arc<SingleFlightTtlCache<BlockKey, Arc<BlockMetadata>>>,
    ttl: CacheTtl,
    timeout: Duration,
    empty: Arc<BlockMetadata>,
    span: Span,
}

impl BlockMetadataService {
    /// Creates the service. `ttl.absent` applies to failed or `null` lookups.
    #[must_use]
    pub fn new(gateway: RpcGateway, ttl: CacheTtl, timeout: Duration) -> Self {
        Self {
            gateway,
            cache: Arc::new(SingleFlightTtlCache::new(BLOCK_CACHE_NAME)),
            ttl,
            timeout,
            empty: Arc::new(BlockMetadata::empty()),
            span: tracing::info_span!("block_metadata"),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the shared cache, e.g. to sweep it or read its stats.
    #[must_use]
    pub fn cache(&self) -> &Arc<SingleFlightTtlCache<BlockKey, Arc<BlockMetadata>>> {
        &self.cache
    }

    /// Returns metadata for `height` on `endpoint`.
    ///
    /// Never fails: an absent lookup yields a record with every field empty.
    /// Concurrent lookups of the same height share one request.
    pub async fn get_block_metadata(
        &self,
        endpoint: &DaemonEndpoint,
        height: u64,
        deadline: Deadline,
    ) -> Arc<BlockMetadata> {
        let key = match BlockKey::new(endpoint, height) {
            Ok(key) => key,
            Err(e) => {
                warn!(parent: &self.span, host = %endpoint.host, error = %e, "invalid daemon address, skipping block lookup");
                return Arc::clone(&self.empty);
            }
        };

        self.cache
            .get_or_fetch(key, self.ttl, || self.fetch(endpoint, height, deadline))
            .await
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }

    async fn fetch(&self, endpoint: &DaemonEndpoint, height: u64, deadline: Deadline) -> Option<Arc<BlockMetadata>> {
        let params = json!([format_hex_u64(height), false]);
        let block = self.gateway.call(endpoint, METHOD_GET_BLOCK_BY_NUMBER, params, deadline, self.timeout).await?;

        let Some(metadata) = BlockMetadata::from_rpc_block(&block) else {
            debug!(parent: &self.span, height, "block result is not an object");
            return None;
        };

        debug!(parent: &self.span, height, tx_count = ?metadata.tx_count, "fetched block metadata");
        Some(Arc::new(metadata))
    }
}
