//! RPC Mock Builder for Ethereum JSON-RPC Testing
//!
//! Wraps mockito to provide the two daemon methods enrichment calls.

use blockmeta_core::{config::DaemonEndpoint, config::PoolConfig, types::ChainFamily};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// Builder for creating mock Ethereum RPC responses.
///
/// Every mock expects exactly one matching request unless a count is given,
/// so [`RpcMockBuilder::assert_all`] also checks that cached lookups did not
/// reach the daemon again.
pub struct RpcMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl RpcMockBuilder {
    /// Creates a new RPC mock builder with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Returns the URL of the mock server.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Returns a daemon endpoint pointing at the mock server.
    #[must_use]
    pub fn endpoint(&self) -> DaemonEndpoint {
        let address = self.server.socket_address();
        DaemonEndpoint::new(address.ip().to_string(), address.port())
    }

    /// Returns an Ethereum pool whose only daemon is the mock server.
    #[must_use]
    pub fn pool(&self, id: &str) -> PoolConfig {
        PoolConfig { id: id.to_string(), family: ChainFamily::Ethereum, daemons: vec![self.endpoint()] }
    }

    /// Mocks an `eth_getBlockByNumber` request for one height, answered once.
    pub fn mock_get_block_by_number(&mut self, block_number: u64, response: &Value) -> &mut Self {
        self.mock_get_block_by_number_times(block_number, response, 1)
    }

    /// Mocks an `eth_getBlockByNumber` request expected exactly `hits` times.
    pub fn mock_get_block_by_number_times(&mut self, block_number: u64, response: &Value, hits: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(get_block_matcher(block_number))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": response
                })
                .to_string(),
            )
            .expect(hits)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks an `eth_blockNumber` request, answered once.
    pub fn mock_block_number(&mut self, block_number: u64) -> &mut Self {
        self.mock_block_number_times(block_number, 1)
    }

    /// Mocks an `eth_blockNumber` request expected exactly `hits` times.
    pub fn mock_block_number_times(&mut self, block_number: u64, hits: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method"\s*:\s*"eth_blockNumber""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": format!("0x{:x}", block_number)
                })
                .to_string(),
            )
            .expect(hits)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks an RPC error response for `method`.
    pub fn mock_rpc_error(&mut self, method: &str, code: i32, message: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": {
                        "code": code,
                        "message": message
                    }
                })
                .to_string(),
            )
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks a server error (500) for every request.
    pub fn mock_server_error(&mut self) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .with_status(500)
            .with_body("Internal Server Error")
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks a 200 response whose body is not JSON.
    pub fn mock_invalid_json(&mut self, method: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{ not json")
            .create();

        self.mocks.push(mock);
        self
    }

    /// Asserts that every mock received its expected number of requests.
    pub fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert();
        }
    }
}

fn get_block_matcher(block_number: u64) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::Regex(r#""method"\s*:\s*"eth_getBlockByNumber""#.to_string()),
        Matcher::Regex(format!(r#""params"\s*:\s*\["0x{block_number:x}"\s*,\s*false\]"#)),
    ])
}

/// Builder for `eth_getBlockByNumber` results.
///
/// Only the fields enrichment reads are set.
pub struct BlockResponseBuilder {
    number: u64,
    timestamp: u64,
    difficulty: u64,
    miner: String,
    gas_used: u64,
    gas_limit: u64,
    base_fee_per_gas: Option<u64>,
    size: u64,
    tx_count: usize,
}

impl BlockResponseBuilder {
    /// Creates a block at `number` with defaults derived from the height.
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self {
            number,
            timestamp: 1_700_000_000 + number * 12,
            difficulty: 0x2_0000,
            miner: format!("0x{:040x}", number),
            gas_used: 21_000,
            gas_limit: 30_000_000,
            base_fee_per_gas: Some(7),
            size: 0x220,
            tx_count: 1,
        }
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn difficulty(mut self, difficulty: u64) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn miner(mut self, miner: impl Into<String>) -> Self {
        self.miner = miner.into();
        self
    }

    #[must_use]
    pub fn gas(mut self, used: u64, limit: u64) -> Self {
        self.gas_used = used;
        self.gas_limit = limit;
        self
    }

    /// Drops `baseFeePerGas`, as on pre-London blocks.
    #[must_use]
    pub fn without_base_fee(mut self) -> Self {
        self.base_fee_per_gas = None;
        self
    }

    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn tx_count(mut self, tx_count: usize) -> Self {
        self.tx_count = tx_count;
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        let transactions: Vec<String> =
            (0..self.tx_count).map(|i| format!("0x{:064x}", self.number * 1000 + i as u64)).collect();

        let mut block = json!({
            "number": format!("0x{:x}", self.number),
            "hash": format!("0x{:064x}", self.number),
            "parentHash": format!("0x{:064x}", self.number.saturating_sub(1)),
            "timestamp": format!("0x{:x}", self.timestamp),
            "difficulty": format!("0x{:x}", self.difficulty),
            "miner": self.miner,
            "gasUsed": format!("0x{:x}", self.gas_used),
            "gasLimit": format!("0x{:x}", self.gas_limit),
            "size": format!("0x{:x}", self.size),
            "transactions": transactions
        });

        if let (Some(fee), Some(object)) = (self.base_fee_per_gas, block.as_object_mut()) {
            object.insert("baseFeePerGas".to_string(), json!(format!("0x{fee:x}")));
        }

        block
    }
}
