//! Batch enrichment against a mock daemon.

use crate::mock_infrastructure::{
    create_default_enricher, create_test_blocks, create_test_pool, BlockResponseBuilder, RpcMockBuilder,
};
use blockmeta_core::{types::ChainFamily, upstream::Deadline};
use chrono::{TimeZone, Utc};
use serde_json::Value;

#[tokio::test]
async fn test_enriches_blocks_and_derives_block_time() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(99, &BlockResponseBuilder::new(99).timestamp(1_700_000_000).build())
        .mock_get_block_by_number(
            100,
            &BlockResponseBuilder::new(100)
                .timestamp(1_700_000_013)
                .difficulty(0x000b_fabc_dbd9_3dda)
                .miner("0x829bd824b016326a401d083b33d092293333a830")
                .gas(0x1c9_c380, 0x1c9_c380)
                .size(0x220)
                .tx_count(3)
                .build(),
        )
        .mock_get_block_by_number(101, &BlockResponseBuilder::new(101).timestamp(1_700_000_025).build());

    let enricher = create_default_enricher();
    let pool = mock.pool("eth1");
    let mut blocks = create_test_blocks("eth1", &[100, 101]);

    enricher.enrich(&pool, &mut blocks, Deadline::none()).await;

    let block = &blocks[0];
    assert_eq!(block.block_difficulty, Some(3_371_913_793_060_314.0));
    assert_eq!(block.block_timestamp, Utc.timestamp_opt(1_700_000_013, 0).single());
    assert_eq!(block.tx_count, Some(3));
    assert_eq!(block.block_miner.as_deref(), Some("0x829bd824b016326a401d083b33d092293333a830"));
    assert_eq!(block.gas_used, Some(30_000_000));
    assert_eq!(block.gas_limit, Some(30_000_000));
    assert_eq!(block.base_fee_per_gas, Some(7));
    assert_eq!(block.block_size_bytes, Some(544));
    assert_eq!(block.block_time_seconds, Some(13.0));

    assert_eq!(blocks[1].block_time_seconds, Some(12.0));

    mock.assert_all();
}

#[tokio::test]
async fn test_out_of_order_timestamps_leave_block_time_unset() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(99, &BlockResponseBuilder::new(99).timestamp(1_700_000_020).build())
        .mock_get_block_by_number(100, &BlockResponseBuilder::new(100).timestamp(1_700_000_010).build());

    let enricher = create_default_enricher();
    let mut blocks = create_test_blocks("eth1", &[100]);

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert!(blocks[0].block_timestamp.is_some());
    assert_eq!(blocks[0].block_time_seconds, None);
}

#[tokio::test]
async fn test_equal_timestamps_give_zero_block_time() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(99, &BlockResponseBuilder::new(99).timestamp(1_700_000_000).build())
        .mock_get_block_by_number(100, &BlockResponseBuilder::new(100).timestamp(1_700_000_000).build());

    let enricher = create_default_enricher();
    let mut blocks = create_test_blocks("eth1", &[100]);

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert_eq!(blocks[0].block_time_seconds, Some(0.0));
}

#[tokio::test]
async fn test_genesis_block_has_no_block_time() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(0, &BlockResponseBuilder::new(0).timestamp(0).build());

    let enricher = create_default_enricher();
    let mut blocks = create_test_blocks("eth1", &[0]);

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert_eq!(blocks[0].block_timestamp, Utc.timestamp_opt(0, 0).single());
    assert_eq!(blocks[0].block_time_seconds, None);
    mock.assert_all();
}

#[tokio::test]
async fn test_missing_predecessor_keeps_block_fields() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(99, &Value::Null)
        .mock_get_block_by_number(100, &BlockResponseBuilder::new(100).build());

    let enricher = create_default_enricher();
    let mut blocks = create_test_blocks("eth1", &[100]);

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert!(blocks[0].block_timestamp.is_some());
    assert_eq!(blocks[0].tx_count, Some(1));
    assert_eq!(blocks[0].block_time_seconds, None);
}

#[tokio::test]
async fn test_pre_london_block_has_no_base_fee() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(9, &BlockResponseBuilder::new(9).without_base_fee().build())
        .mock_get_block_by_number(10, &BlockResponseBuilder::new(10).without_base_fee().build());

    let enricher = create_default_enricher();
    let mut blocks = create_test_blocks("eth1", &[10]);

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert_eq!(blocks[0].base_fee_per_gas, None);
    assert_eq!(blocks[0].gas_limit, Some(30_000_000));
}

#[tokio::test]
async fn test_non_loopback_daemon_is_never_contacted() {
    let enricher = create_default_enricher();
    let pool = create_test_pool("eth1", ChainFamily::Ethereum, "192.168.1.5", 8545);
    let mut blocks = create_test_blocks("eth1", &[100, 101]);

    enricher.enrich(&pool, &mut blocks, Deadline::none()).await;

    assert!(blocks.iter().all(|b| b.is_unenriched()));
    assert_eq!(enricher.stats().blocks.misses, 0);
    assert_eq!(enricher.stats().blocks.entries, 0);
}

#[tokio::test]
async fn test_other_family_leaves_blocks_untouched() {
    let mock = RpcMockBuilder::new().await;
    let enricher = create_default_enricher();
    let mut pool = mock.pool("btc1");
    pool.family = ChainFamily::Bitcoin;

    let mut blocks = create_test_blocks("btc1", &[100]);
    blocks[0].block_difficulty = Some(42.0);
    let before = blocks.clone();

    enricher.enrich(&pool, &mut blocks, Deadline::none()).await;

    assert_eq!(blocks, before);
    assert_eq!(enricher.stats().blocks.entries, 0);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let mock = RpcMockBuilder::new().await;
    let enricher = create_default_enricher();
    let mut blocks = Vec::new();

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert!(blocks.is_empty());
    assert_eq!(enricher.stats().blocks.entries, 0);
}

#[tokio::test]
async fn test_overlapping_batches_fetch_each_height_once() {
    let mut mock = RpcMockBuilder::new().await;
    for height in 99..=102 {
        mock.mock_get_block_by_number(height, &BlockResponseBuilder::new(height).build());
    }

    let enricher = create_default_enricher();
    let pool = mock.pool("eth1");

    let mut first = create_test_blocks("eth1", &[100, 101]);
    let mut second = create_test_blocks("eth1", &[101, 102]);
    enricher.enrich(&pool, &mut first, Deadline::none()).await;
    enricher.enrich(&pool, &mut second, Deadline::none()).await;

    assert!(first.iter().chain(second.iter()).all(|b| b.block_time_seconds == Some(12.0)));

    let stats = enricher.stats().blocks;
    assert_eq!(stats.misses, 4);
    assert_eq!(stats.hits, 2);
    mock.assert_all();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_batches_share_in_flight_fetches() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(199, &BlockResponseBuilder::new(199).build())
        .mock_get_block_by_number(200, &BlockResponseBuilder::new(200).build());

    let enricher = create_default_enricher();
    let pool = mock.pool("eth1");

    let runs = (0..6).map(|_| {
        let enricher = &enricher;
        let pool = &pool;
        async move {
            let mut blocks = create_test_blocks("eth1", &[200]);
            enricher.enrich(pool, &mut blocks, Deadline::none()).await;
            blocks
        }
    });
    let results = futures::future::join_all(runs).await;

    for blocks in results {
        assert_eq!(blocks[0].block_time_seconds, Some(12.0));
    }
    mock.assert_all();
}

#[tokio::test]
async fn test_duplicate_heights_in_one_batch() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_block_by_number(49, &BlockResponseBuilder::new(49).build())
        .mock_get_block_by_number(50, &BlockResponseBuilder::new(50).build());

    let enricher = create_default_enricher();
    let mut blocks = create_test_blocks("eth1", &[50, 50, 50]);

    enricher.enrich(&mock.pool("eth1"), &mut blocks, Deadline::none()).await;

    assert_eq!(blocks.len(), 3);
    assert!(blocks.iter().all(|b| b.block_time_seconds == Some(12.0)));
    mock.assert_all();
}
