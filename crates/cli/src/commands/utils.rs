use blockmeta_core::{
    config::{AppConfig, PoolConfig},
    enrichment::{BlockEnricher, BlockEnricherBuilder, BuilderError},
};
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Config(String),
    Io(String),
    Setup(String),
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Setup(msg) => write!(f, "Setup error: {msg}"),
            Self::General(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::General(error.to_string())
    }
}

impl From<BuilderError> for CliError {
    fn from(error: BuilderError) -> Self {
        Self::Setup(error.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

pub fn print_success(message: &str) {
    println!("[SUCCESS] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn print_info(message: &str) {
    println!("[INFO] {message}");
}

/// Looks up `pool_id` in `config`.
pub fn find_pool<'a>(config: &'a AppConfig, pool_id: &str) -> CliResult<&'a PoolConfig> {
    config.pool(pool_id).ok_or_else(|| {
        let known: Vec<&str> = config.pools.iter().map(|p| p.id.as_str()).collect();
        CliError::Config(format!("Unknown pool '{pool_id}' (configured: {})", known.join(", ")))
    })
}

/// Builds an enricher from the `[enrichment]` section, logging under a span for `pool_id`.
pub fn build_enricher(config: &AppConfig, pool_id: &str) -> CliResult<BlockEnricher> {
    let span = tracing::info_span!("enrichment", pool = %pool_id);
    Ok(BlockEnricherBuilder::new().config(config.enrichment.clone()).span(span).build()?)
}

/// Renders an optional value, `-` when absent.
pub fn display_opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
