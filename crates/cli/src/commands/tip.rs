use blockmeta_core::{config::AppConfig, upstream::Deadline};
use std::time::Duration;

use super::utils::{build_enricher, find_pool, print_info, print_success, CliResult};

/// Prints the chain tip height of `pool_id`.
///
/// An unavailable height is reported, not treated as an error.
pub async fn run_tip(config: &AppConfig, pool_id: &str, timeout: Duration) -> CliResult<()> {
    let pool = find_pool(config, pool_id)?;
    let enricher = build_enricher(config, pool_id)?;

    match enricher.chain_tip_height(pool, Deadline::after(timeout)).await {
        Some(height) => print_success(&format!("Chain tip of {pool_id}: {height}")),
        None => print_info(&format!("Chain tip of {pool_id}: unavailable")),
    }

    Ok(())
}
