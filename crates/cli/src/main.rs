use blockmeta_core::config::{AppConfig, LoggingConfig};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{handle_config_command, run_enrich, run_tip, utils::CliError, ConfigCommands};

#[derive(Parser)]
#[command(name = "blockmeta-cli")]
#[command(about = "Blockmeta CLI - enrich pool blocks with metadata from the local node")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (defaults to `BLOCKMETA_CONFIG`, then config/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chain tip height of a pool
    Tip {
        /// Pool id
        #[arg(short, long)]
        pool: String,

        /// Overall deadline in seconds
        #[arg(long, default_value = "5")]
        timeout: u64,
    },

    /// Enrich blocks at the given heights and print them
    Enrich {
        /// Pool id
        #[arg(short, long)]
        pool: String,

        /// Block height (can be specified multiple times)
        #[arg(long = "height", required = true)]
        heights: Vec<u64>,

        /// Print the enriched blocks as JSON
        #[arg(long)]
        json: bool,

        /// Overall deadline in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },

    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Installs the tracing subscriber. Logs go to stderr so `--json` output stays parseable.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,blockmeta_core={0},blockmeta_cli={0}", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        // "pretty" and any other format default to pretty logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    let config = match path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tip { pool, timeout } => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(&config.logging);
            tracing::debug!(pools = config.pools.len(), "configuration loaded");
            run_tip(&config, &pool, Duration::from_secs(timeout)).await?;
        }

        Commands::Enrich { pool, heights, json, timeout } => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(&config.logging);
            tracing::debug!(pools = config.pools.len(), heights = heights.len(), "configuration loaded");
            run_enrich(&config, &pool, &heights, json, Duration::from_secs(timeout)).await?;
        }

        Commands::Config(config_command) => {
            let default_file = cli.config.unwrap_or_else(AppConfig::default_path);
            handle_config_command(config_command, &default_file)?;
        }
    }

    Ok(())
}
