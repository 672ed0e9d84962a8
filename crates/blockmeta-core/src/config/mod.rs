//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `BLOCKMETA_CONFIG` env var
//! 3. **Environment variables**: `BLOCKMETA__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`PoolConfig`]: pools and the node daemons they talk to
//! - [`EnrichmentConfig`]: cache TTLs, per-operation timeouts, HTTP concurrency
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [enrichment]
//! block_cache_ttl_seconds = 600
//! absent_block_ttl_seconds = 30
//!
//! [[pools]]
//! id = "eth1"
//! family = "ethereum"
//!
//! [[pools.daemons]]
//! host = "127.0.0.1"
//! port = 8545
//! ```

use crate::types::ChainFamily;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, net::IpAddr, path::Path, time::Duration};
use url::Url;

/// A node daemon a pool is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonEndpoint {
    /// Hostname or IP literal. Only loopback hosts are ever contacted.
    pub host: String,

    /// JSON-RPC port.
    pub port: u16,

    /// Use `https` instead of `http`. Defaults to `false`.
    #[serde(default)]
    pub ssl: bool,

    /// Request path appended after the port. A leading `/` is optional.
    #[serde(default)]
    pub http_path: Option<String>,

    /// Optional role tag (e.g. `"wallet"`). Untagged daemons are preferred.
    #[serde(default)]
    pub category: Option<String>,
}

impl DaemonEndpoint {
    /// Creates an untagged plain-HTTP endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, ssl: false, http_path: None, category: None }
    }

    fn is_untagged(&self) -> bool {
        self.category.as_deref().is_none_or(|c| c.trim().is_empty())
    }

    /// Builds `{scheme}://{host}:{port}/{path}` for this daemon.
    ///
    /// IPv6 literals are bracketed; a bracketed host is used as is.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the host or path cannot form a valid URL.
    pub fn rpc_url(&self) -> Result<Url, url::ParseError> {
        let scheme = if self.ssl { "https" } else { "http" };
        let host = self.host.trim();
        let host = match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{host}]"),
            _ => host.to_string(),
        };

        let mut url = Url::parse(&format!("{scheme}://{host}:{}/", self.port))?;
        if let Some(path) = self.http_path.as_deref() {
            url.set_path(path.trim_start_matches('/'));
        }
        Ok(url)
    }
}

/// A mining pool and its node daemons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Unique pool identifier.
    pub id: String,

    /// Coin family of the pool.
    pub family: ChainFamily,

    /// Node daemons, in configuration order.
    #[serde(default)]
    pub daemons: Vec<DaemonEndpoint>,
}

impl PoolConfig {
    /// Returns the daemon used for enrichment: the first one without a category
    /// tag, otherwise the first configured one.
    #[must_use]
    pub fn preferred_daemon(&self) -> Option<&DaemonEndpoint> {
        self.daemons.iter().find(|d| d.is_untagged()).or_else(|| self.daemons.first())
    }
}

/// Cache, timeout and transport settings for enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Lifetime of a cached chain tip height in milliseconds. Defaults to `3000`.
    #[serde(default = "default_tip_cache_ttl_ms")]
    pub tip_cache_ttl_ms: u64,

    /// Lifetime of cached block metadata in seconds. Defaults to `600`.
    #[serde(default = "default_block_cache_ttl_seconds")]
    pub block_cache_ttl_seconds: u64,

    /// Lifetime of a failed or empty block lookup in seconds. Defaults to `600`.
    #[serde(default = "default_absent_block_ttl_seconds")]
    pub absent_block_ttl_seconds: u64,

    /// Upper bound for `eth_blockNumber` in milliseconds. Defaults to `2000`.
    #[serde(default = "default_tip_timeout_ms")]
    pub tip_timeout_ms: u64,

    /// Upper bound for `eth_getBlockByNumber` in milliseconds. Defaults to `3000`.
    #[serde(default = "default_block_timeout_ms")]
    pub block_timeout_ms: u64,

    /// Interval of the background sweep of expired entries. `0` disables it.
    /// Defaults to `60`.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Maximum concurrent outbound requests. Defaults to `64`.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_tip_cache_ttl_ms() -> u64 {
    3_000
}

fn default_block_cache_ttl_seconds() -> u64 {
    600
}

fn default_absent_block_ttl_seconds() -> u64 {
    600
}

fn default_tip_timeout_ms() -> u64 {
    2_000
}

fn default_block_timeout_ms() -> u64 {
    3_000
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_max_concurrent_requests() -> usize {
    64
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            tip_cache_ttl_ms: default_tip_cache_ttl_ms(),
            block_cache_ttl_seconds: default_block_cache_ttl_seconds(),
            absent_block_ttl_seconds: default_absent_block_ttl_seconds(),
            tip_timeout_ms: default_tip_timeout_ms(),
            block_timeout_ms: default_block_timeout_ms(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl EnrichmentConfig {
    #[must_use]
    pub fn tip_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.tip_cache_ttl_ms)
    }

    #[must_use]
    pub fn block_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.block_cache_ttl_seconds)
    }

    #[must_use]
    pub fn absent_block_ttl(&self) -> Duration {
        Duration::from_secs(self.absent_block_ttl_seconds)
    }

    #[must_use]
    pub fn tip_timeout(&self) -> Duration {
        Duration::from_millis(self.tip_timeout_ms)
    }

    #[must_use]
    pub fn block_timeout(&self) -> Duration {
        Duration::from_millis(self.block_timeout_ms)
    }

    /// Returns the sweep interval, or `None` when the sweep is disabled.
    #[must_use]
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0).then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Root application configuration.
///
/// Loaded with the `BLOCKMETA` prefix for environment overrides using `__` as a
/// separator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configured pools.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,

    /// Enrichment cache and timeout settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Use `__` as a separator for nested fields (e.g.
    /// `BLOCKMETA__ENRICHMENT__ABSENT_BLOCK_TTL_SECONDS=30`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("BLOCKMETA").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml`, overridable with
    /// `BLOCKMETA_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(Self::default_path())
    }

    /// Returns `BLOCKMETA_CONFIG` if set, otherwise `config/config.toml`.
    #[must_use]
    pub fn default_path() -> String {
        std::env::var("BLOCKMETA_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string())
    }

    /// Looks up a pool by id.
    #[must_use]
    pub fn pool(&self, id: &str) -> Option<&PoolConfig> {
        self.pools.iter().find(|p| p.id == id)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for pool in &self.pools {
            if pool.id.trim().is_empty() {
                return Err("Pool id must not be empty".to_string());
            }
            if !seen.insert(pool.id.as_str()) {
                return Err(format!("Duplicate pool id: {}", pool.id));
            }
            for daemon in &pool.daemons {
                if daemon.host.trim().is_empty() {
                    return Err(format!("Empty daemon host for pool: {}", pool.id));
                }
                if daemon.port == 0 {
                    return Err(format!("Daemon port must be greater than 0 for pool: {}", pool.id));
                }
                if let Err(e) = daemon.rpc_url() {
                    return Err(format!("Invalid daemon address for pool {}: {e}", pool.id));
                }
            }
        }

        let e = &self.enrichment;
        if e.tip_cache_ttl_ms == 0 || e.block_cache_ttl_seconds == 0 || e.absent_block_ttl_seconds == 0
        {
            return Err("Cache TTLs must be greater than 0".to_string());
        }

        if e.tip_timeout_ms == 0 || e.block_timeout_ms == 0 {
            return Err("Request timeouts must be greater than 0".to_string());
        }

        if e.max_concurrent_requests == 0 {
            return Err("Max concurrent requests must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
