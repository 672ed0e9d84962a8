//! Core type definitions for JSON-RPC and block records.
//!
//! # Type Categories
//!
//! ## JSON-RPC Protocol Types
//! - [`JsonRpcRequest`], [`JsonRpcResponse`], [`JsonRpcError`]: outbound envelope and reply
//!
//! ## Domain Types
//! - [`ChainFamily`]: coin family a pool belongs to; enrichment only runs for
//!   [`ChainFamily::Ethereum`]
//! - [`Block`]: a locally recorded block whose metadata fields are filled in place

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// JSON-RPC protocol version constant to avoid repeated allocations.
pub const JSONRPC_VERSION: &str = "2.0";

/// Pre-allocated `Cow` for JSON-RPC version - zero allocation for static usage.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// Fixed request id; every call is a single request on its own connection.
pub const JSONRPC_REQUEST_ID: u64 = 1;

/// Returns the most recent block number known to the node.
pub const METHOD_BLOCK_NUMBER: &str = "eth_blockNumber";

/// Returns a block by height.
pub const METHOD_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// JSON-RPC 2.0 request structure.
///
/// # Example
///
/// ```
/// use blockmeta_core::types::JsonRpcRequest;
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new("eth_blockNumber", json!([]));
/// let body = serde_json::to_string(&request).unwrap();
///
/// assert_eq!(body, r#"{"jsonrpc":"2.0","id":1,"method":"eth_blockNumber","params":[]}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub id: u64,
    pub method: Cow<'static, str>,
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    /// Creates a request with the fixed id and zero allocation for the version string.
    #[must_use]
    pub fn new(method: impl Into<Cow<'static, str>>, params: serde_json::Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, id: JSONRPC_REQUEST_ID, method: method.into(), params }
    }
}

/// JSON-RPC 2.0 response structure.
///
/// A response carries either a `result` or an `error`. Both fields are optional
/// here so that a malformed reply still deserializes and can be classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error object.
///
/// - `-32700`: Parse error (invalid JSON)
/// - `-32600`: Invalid request (malformed JSON-RPC)
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
/// - `-32000` to `-32099`: Server-defined errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Coin family of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Ethereum,
    Bitcoin,
    Equihash,
    Cryptonote,
    Ergo,
}

impl std::fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ethereum => "ethereum",
            Self::Bitcoin => "bitcoin",
            Self::Equihash => "equihash",
            Self::Cryptonote => "cryptonote",
            Self::Ergo => "ergo",
        };
        f.write_str(name)
    }
}

/// A block found by a pool, as handed over by the persistence layer.
///
/// The enrichment fields start out empty and are filled in place by
/// [`BlockEnricher::enrich`](crate::enrichment::BlockEnricher::enrich). The
/// caller owns the records; enrichment never adds or removes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub pool_id: String,
    pub block_height: u64,

    pub block_difficulty: Option<f64>,
    pub block_timestamp: Option<DateTime<Utc>>,
    pub tx_count: Option<u64>,
    pub block_miner: Option<String>,
    pub gas_used: Option<u64>,
    pub gas_limit: Option<u64>,
    pub base_fee_per_gas: Option<u64>,
    pub block_size_bytes: Option<u64>,

    /// Seconds since the previous block; derived, never negative.
    pub block_time_seconds: Option<f64>,
}

impl Block {
    /// Creates an un-enriched record for the given pool and height.
    #[must_use]
    pub fn new(pool_id: impl Into<String>, block_height: u64) -> Self {
        Self { pool_id: pool_id.into(), block_height, ..Default::default() }
    }

    /// Returns `true` if none of the enrichment fields have been set.
    #[must_use]
    pub fn is_unenriched(&self) -> bool {
        self.block_difficulty.is_none() &&
            self.block_timestamp.is_none() &&
            self.tx_count.is_none() &&
            self.block_miner.is_none() &&
            self.gas_used.is_none() &&
            self.gas_limit.is_none() &&
            self.base_fee_per_gas.is_none() &&
            self.block_size_bytes.is_none() &&
            self.block_time_seconds.is_none()
    }
}
