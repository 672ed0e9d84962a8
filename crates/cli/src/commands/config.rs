use blockmeta_core::config::AppConfig;
use clap::Subcommand;
use std::path::Path;

use super::utils::{display_opt, print_error, print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the current configuration
    Validate {
        /// Path to config file (defaults to --config)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Show current configuration
    Show {
        /// Path to config file (defaults to --config)
        #[arg(short, long)]
        file: Option<String>,
    },
}

pub fn handle_config_command(command: ConfigCommands, default_file: &str) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(file.as_deref().unwrap_or(default_file)),
        ConfigCommands::Show { file } => show_config(file.as_deref().unwrap_or(default_file)),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));

    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Pools: {}", config.pools.len());
    println!(
        "  Block cache: {}s (absent: {}s)",
        config.enrichment.block_cache_ttl_seconds, config.enrichment.absent_block_ttl_seconds
    );
    println!(
        "  Expiry sweep: {}",
        config.enrichment.sweep_interval().map_or_else(|| "disabled".to_string(), |d| format!("every {}s", d.as_secs()))
    );

    Ok(())
}

fn show_config(file: &str) -> CliResult<()> {
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    println!("Configuration from {file}:");

    println!("\n[Pools] ({} pools)", config.pools.len());
    for pool in &config.pools {
        println!("  {} ({})", pool.id, pool.family);
        for daemon in &pool.daemons {
            let url = daemon.rpc_url().map_or_else(|e| format!("invalid: {e}"), String::from);
            println!("    daemon: {url} category={}", display_opt(daemon.category.as_deref()));
        }
        if let Some(daemon) = pool.preferred_daemon() {
            println!("    enrichment daemon: {}:{}", daemon.host, daemon.port);
        }
    }

    let e = &config.enrichment;
    println!("\n[Enrichment]");
    println!("  Tip Cache TTL: {}ms", e.tip_cache_ttl_ms);
    println!("  Block Cache TTL: {}s", e.block_cache_ttl_seconds);
    println!("  Absent Block TTL: {}s", e.absent_block_ttl_seconds);
    println!("  Tip Timeout: {}ms", e.tip_timeout_ms);
    println!("  Block Timeout: {}ms", e.block_timeout_ms);
    println!("  Sweep Interval: {}s", e.sweep_interval_seconds);
    println!("  Max Concurrent Requests: {}", e.max_concurrent_requests);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}
