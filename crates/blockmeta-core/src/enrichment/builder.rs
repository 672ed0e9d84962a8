//! Builder for [`BlockEnricher`].

use crate::{
    cache::CacheTtl,
    config::EnrichmentConfig,
    enrichment::{enricher::BlockEnricher, metadata::BlockMetadataService, tip::TipHeightService},
    upstream::{HttpClient, HttpClientConfig, RpcGateway},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::Span;

/// Errors that can occur while building a [`BlockEnricher`].
#[derive(Debug, Error)]
pub enum BuilderError {
    /// HTTP client initialization failed
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(String),

    /// A TTL, timeout or concurrency limit was zero
    #[error("Invalid enrichment config: {0}")]
    InvalidConfig(&'static str),
}

/// Builder for a [`BlockEnricher`].
///
/// # Examples
///
/// ```no_run
/// # use blockmeta_core::{config::EnrichmentConfig, enrichment::BlockEnricherBuilder};
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let enricher = BlockEnricherBuilder::new()
///     .config(EnrichmentConfig { absent_block_ttl_seconds: 30, ..Default::default() })
///     .span(tracing::info_span!("enrichment", pool = "eth1"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct BlockEnricherBuilder {
    config: EnrichmentConfig,
    http_client: Option<Arc<HttpClient>>,
    span: Option<Span>,
}

impl BlockEnricherBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { config: EnrichmentConfig::default(), http_client: None, span: None }
    }

    #[must_use]
    pub fn config(mut self, config: EnrichmentConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares an existing HTTP client instead of creating one from the config.
    #[must_use]
    pub fn http_client(mut self, client: Arc<HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the parent span of every event the enricher and its services emit.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the enricher.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidConfig` if a TTL, timeout or the concurrency limit is zero.
    /// Returns `BuilderError::HttpClientInit` if HTTP client initialization fails.
    pub fn build(self) -> Result<BlockEnricher, BuilderError> {
        let config = self.config;
        validate(&config)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let http_config =
                    HttpClientConfig { concurrent_limit: config.max_concurrent_requests, ..Default::default() };
                Arc::new(
                    HttpClient::with_config(http_config).map_err(|e| BuilderError::HttpClientInit(e.to_string()))?,
                )
            }
        };

        let span = self.span.unwrap_or_else(|| tracing::info_span!("enrichment"));
        let gateway = RpcGateway::new(http_client).with_span(span.clone());

        let tip = TipHeightService::new(gateway.clone(), config.tip_cache_ttl(), config.tip_timeout())
            .with_span(span.clone());
        let metadata = BlockMetadataService::new(
            gateway,
            CacheTtl::new(config.block_cache_ttl(), config.absent_block_ttl()),
            config.block_timeout(),
        )
        .with_span(span.clone());

        Ok(BlockEnricher::new(tip, metadata, config.sweep_interval(), span))
    }
}

impl Default for BlockEnricherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &EnrichmentConfig) -> Result<(), BuilderError> {
    if config.tip_cache_ttl_ms == 0 || config.block_cache_ttl_seconds == 0 || config.absent_block_ttl_seconds == 0 {
        return Err(BuilderError::InvalidConfig("cache TTLs must be greater than 0"));
    }
    if config.tip_timeout_ms == 0 || config.block_timeout_ms == 0 {
        return Err(BuilderError::InvalidConfig("request timeouts must be greater than 0"));
    }
    if config.max_concurrent_requests == 0 {
        return Err(BuilderError::InvalidConfig("max concurrent requests must be greater than 0"));
    }
    Ok(())
}
