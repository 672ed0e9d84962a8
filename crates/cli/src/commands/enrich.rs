use blockmeta_core::{config::AppConfig, types::Block, upstream::Deadline};
use std::time::Duration;

use super::utils::{build_enricher, display_opt, find_pool, print_info, CliResult};

/// Enriches blocks at `heights` of `pool_id` and prints them.
pub async fn run_enrich(
    config: &AppConfig,
    pool_id: &str,
    heights: &[u64],
    json: bool,
    timeout: Duration,
) -> CliResult<()> {
    let pool = find_pool(config, pool_id)?;
    let enricher = build_enricher(config, pool_id)?;

    let mut blocks: Vec<Block> = heights.iter().map(|&height| Block::new(pool.id.clone(), height)).collect();
    enricher.enrich(pool, &mut blocks, Deadline::after(timeout)).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    for block in &blocks {
        println!("{}", format_block(block));
    }

    let enriched = blocks.iter().filter(|b| !b.is_unenriched()).count();
    print_info(&format!("{enriched}/{} blocks enriched", blocks.len()));

    Ok(())
}

fn format_block(block: &Block) -> String {
    format!(
        "#{} time={} block_time={}s txs={} miner={} gas={}/{} base_fee={} size={} difficulty={}",
        block.block_height,
        display_opt(block.block_timestamp.map(|ts| ts.to_rfc3339())),
        display_opt(block.block_time_seconds),
        display_opt(block.tx_count),
        display_opt(block.block_miner.as_deref()),
        display_opt(block.gas_used),
        display_opt(block.gas_limit),
        display_opt(block.base_fee_per_gas),
        display_opt(block.block_size_bytes),
        display_opt(block.block_difficulty),
    )
}
