//! Chain tip height lookups against a mock daemon.

use crate::mock_infrastructure::{create_default_enricher, create_test_pool, RpcMockBuilder};
use blockmeta_core::{
    config::EnrichmentConfig, enrichment::BlockEnricherBuilder, types::ChainFamily, upstream::Deadline,
};
use std::time::Duration;

#[tokio::test]
async fn test_tip_height_is_cached_within_ttl() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number_times(0x12_d687, 1);

    let enricher = create_default_enricher();
    let pool = mock.pool("eth1");

    assert_eq!(enricher.chain_tip_height(&pool, Deadline::none()).await, Some(1_234_567));
    assert_eq!(enricher.chain_tip_height(&pool, Deadline::none()).await, Some(1_234_567));

    assert_eq!(enricher.stats().tip.hits, 1);
    mock.assert_all();
}

#[tokio::test]
async fn test_tip_height_refreshes_after_ttl() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number_times(500, 2);

    let config = EnrichmentConfig { tip_cache_ttl_ms: 50, ..Default::default() };
    let enricher = BlockEnricherBuilder::new().config(config).build().unwrap();
    let pool = mock.pool("eth1");

    assert_eq!(enricher.chain_tip_height(&pool, Deadline::none()).await, Some(500));
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(enricher.chain_tip_height(&pool, Deadline::none()).await, Some(500));

    assert_eq!(enricher.stats().tip.misses, 2);
    mock.assert_all();
}

#[tokio::test]
async fn test_tip_height_is_keyed_by_pool() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number_times(42, 2);

    let enricher = create_default_enricher();

    assert_eq!(enricher.chain_tip_height(&mock.pool("eth1"), Deadline::none()).await, Some(42));
    assert_eq!(enricher.chain_tip_height(&mock.pool("eth2"), Deadline::none()).await, Some(42));

    assert_eq!(enricher.stats().tip.entries, 2);
    mock.assert_all();
}

#[tokio::test]
async fn test_tip_height_rpc_error_is_none() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_rpc_error("eth_blockNumber", -32601, "Method not found");

    let enricher = create_default_enricher();

    assert_eq!(enricher.chain_tip_height(&mock.pool("eth1"), Deadline::none()).await, None);
}

#[tokio::test]
async fn test_tip_height_server_error_is_none() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_server_error();

    let enricher = create_default_enricher();

    assert_eq!(enricher.chain_tip_height(&mock.pool("eth1"), Deadline::none()).await, None);
}

#[tokio::test]
async fn test_tip_height_invalid_json_is_none() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_invalid_json("eth_blockNumber");

    let enricher = create_default_enricher();

    assert_eq!(enricher.chain_tip_height(&mock.pool("eth1"), Deadline::none()).await, None);
}

#[tokio::test]
async fn test_tip_height_skips_untrusted_and_foreign_pools() {
    let enricher = create_default_enricher();

    let remote = create_test_pool("eth1", ChainFamily::Ethereum, "10.0.0.8", 8545);
    let bitcoin = create_test_pool("btc1", ChainFamily::Bitcoin, "127.0.0.1", 8332);

    assert_eq!(enricher.chain_tip_height(&remote, Deadline::none()).await, None);
    assert_eq!(enricher.chain_tip_height(&bitcoin, Deadline::none()).await, None);

    let stats = enricher.stats().tip;
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.entries, 0);
}
