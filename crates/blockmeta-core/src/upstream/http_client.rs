use reqwest::{Client, ClientBuilder};
use std::{sync::Arc, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::upstream::{Deadline, UpstreamError};

/// Longest response body excerpt kept in an [`UpstreamError::HttpError`].
const MAX_ERROR_BODY: usize = 256;

/// Configuration for HTTP client concurrency.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum number of concurrent HTTP requests allowed
    pub concurrent_limit: usize,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { concurrent_limit: 64, connect_timeout: Duration::from_secs(2) }
    }
}

/// HTTP client with semaphore-based concurrency control.
///
/// Every request is bounded by an absolute deadline covering permit
/// acquisition, the round trip and reading the body. Requests are never
/// retried here; a failed lookup is cached as absent one layer up.
pub struct HttpClient {
    client: Client,
    concurrent_limit: Arc<Semaphore>,
}

/// RAII guard ensuring semaphore permits are always released.
struct PermitGuard {
    _permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
}

impl PermitGuard {
    fn new(permit: OwnedSemaphorePermit, semaphore: Arc<Semaphore>) -> Self {
        Self { _permit: permit, semaphore }
    }
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        tracing::trace!(
            available_permits = self.semaphore.available_permits(),
            "permit guard dropped"
        );
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Sanitizes network errors so daemon URLs never end up in logs or caches.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else {
            "network error".to_string()
        }
    }

    /// Creates a new HTTP client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, UpstreamError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(config.concurrent_limit)
            .connect_timeout(config.connect_timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .user_agent(concat!("blockmeta/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                UpstreamError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client, concurrent_limit: Arc::new(Semaphore::new(config.concurrent_limit)) })
    }

    /// Sends an HTTP POST request.
    ///
    /// Waiting for a concurrency permit is bounded by the caller `deadline`
    /// only. The `timeout` clock starts once the permit is held.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Timeout`] if the deadline or the timeout passes at any stage
    /// - [`UpstreamError::ConcurrencyLimit`] if the semaphore is closed
    /// - [`UpstreamError::HttpError`] for non-success HTTP status codes
    /// - [`UpstreamError::ConnectionFailed`] for network-related failures
    pub async fn send_request(
        &self,
        url: &str,
        body: bytes::Bytes,
        deadline: Deadline,
        timeout: Duration,
    ) -> Result<bytes::Bytes, UpstreamError> {
        let acquire = Arc::clone(&self.concurrent_limit).acquire_owned();
        let permit = match deadline.instant() {
            Some(until) => tokio::time::timeout_at(until, acquire).await.map_err(|_| {
                tracing::warn!(
                    available_permits = self.concurrent_limit.available_permits(),
                    "caller deadline passed while waiting for an http permit"
                );
                UpstreamError::Timeout
            })?,
            None => acquire.await,
        }
        .map_err(|_| UpstreamError::ConcurrencyLimit("semaphore closed".to_string()))?;

        let _permit_guard = PermitGuard::new(permit, self.concurrent_limit.clone());

        let exchange = async {
            let response = self
                .client
                .post(url)
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| UpstreamError::ConnectionFailed(Self::sanitize_network_error(&e)))?;

            let status = response.status();
            if !status.is_success() {
                let raw_text = response.text().await.unwrap_or_default();
                let sanitized_text = if raw_text.len() > MAX_ERROR_BODY {
                    let cut = (0..=MAX_ERROR_BODY).rev().find(|i| raw_text.is_char_boundary(*i)).unwrap_or(0);
                    format!("{}... (truncated)", &raw_text[..cut])
                } else {
                    raw_text
                };
                return Err(UpstreamError::HttpError(status.as_u16(), sanitized_text));
            }

            response
                .bytes()
                .await
                .map_err(|e| UpstreamError::ConnectionFailed(Self::sanitize_network_error(&e)))
        };

        tokio::time::timeout_at(deadline.bounded_by(timeout), exchange).await.map_err(|_| UpstreamError::Timeout)?
    }

    #[cfg(test)]
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.concurrent_limit.available_permits()
    }
}
