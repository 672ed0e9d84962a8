//! Single JSON-RPC calls to a pool's node daemon.
//!
//! [`RpcGateway`] owns the outbound side of enrichment: it enforces the
//! loopback trust policy before any network activity, wraps the call in the
//! JSON-RPC 2.0 envelope, bounds it by the caller deadline intersected with
//! the operation timeout and classifies every failure as an [`UpstreamError`].
//! It never retries.

use crate::{
    config::DaemonEndpoint,
    metrics,
    types::{JsonRpcRequest, JsonRpcResponse},
    upstream::{http_client::HttpClient, trust::is_loopback_host, Deadline, UpstreamError},
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn, Span};

/// Sends one JSON-RPC request per call to a trusted daemon.
#[derive(Clone)]
pub struct RpcGateway {
    http: Arc<HttpClient>,
    span: Span,
}

impl RpcGateway {
    /// Creates a gateway over a shared HTTP client.
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http, span: tracing::info_span!("rpc_gateway") }
    }

    /// Replaces the span all gateway events are recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Calls `method` and returns its `result`, or `None` on any failure.
    ///
    /// Failures are logged once here. A refused host is logged separately from
    /// network failures.
    pub async fn call(
        &self,
        endpoint: &DaemonEndpoint,
        method: &'static str,
        params: Value,
        deadline: Deadline,
        timeout: Duration,
    ) -> Option<Value> {
        match self.try_call(endpoint, method, params, deadline, timeout).await {
            Ok(value) => Some(value),
            Err(e) if e.is_policy_violation() => {
                warn!(parent: &self.span, host = %endpoint.host, method, "daemon host is not loopback, call refused");
                None
            }
            Err(e) if e.is_empty_result() => {
                debug!(parent: &self.span, method, "daemon returned no result");
                None
            }
            Err(e) => {
                warn!(parent: &self.span, method, error = %e, "daemon call failed");
                None
            }
        }
    }

    /// Calls `method` and returns its `result`.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::HostNotPermitted`] before any network activity if the
    ///   daemon host is not loopback
    /// - [`UpstreamError::Timeout`] once the effective deadline passes, or
    ///   before any network activity if the caller deadline already has
    /// - [`UpstreamError::HttpError`] / [`UpstreamError::ConnectionFailed`] for transport failures
    /// - [`UpstreamError::InvalidResponse`] if the body is not a JSON-RPC reply
    /// - [`UpstreamError::RpcError`] if the daemon returned an error object
    /// - [`UpstreamError::EmptyResult`] if `result` is `null` or missing
    pub async fn try_call(
        &self,
        endpoint: &DaemonEndpoint,
        method: &'static str,
        params: Value,
        deadline: Deadline,
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        if !is_loopback_host(&endpoint.host) {
            metrics::record_rpc_request(method, "not_permitted", Duration::ZERO);
            return Err(UpstreamError::HostNotPermitted(endpoint.host.clone()));
        }

        if deadline.is_expired() {
            metrics::record_rpc_request(method, UpstreamError::Timeout.as_metric_str(), Duration::ZERO);
            return Err(UpstreamError::Timeout);
        }

        let started = std::time::Instant::now();
        let result = self.exchange(endpoint, method, params, deadline, timeout).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.as_metric_str(),
        };
        metrics::record_rpc_request(method, outcome, started.elapsed());

        result
    }

    async fn exchange(
        &self,
        endpoint: &DaemonEndpoint,
        method: &'static str,
        params: Value,
        deadline: Deadline,
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        let url = endpoint
            .rpc_url()
            .map_err(|e| UpstreamError::InvalidRequest(format!("invalid daemon url: {e}")))?;

        let body = serde_json::to_vec(&JsonRpcRequest::new(method, params))
            .map_err(|e| UpstreamError::InvalidRequest(format!("failed to serialize request: {e}")))?;

        debug!(parent: &self.span, method, port = endpoint.port, "sending request to daemon");

        let bytes =
            self.http.send_request(url.as_str(), bytes::Bytes::from(body), deadline, timeout).await?;

        let response: JsonRpcResponse = serde_json::from_slice(&bytes)
            .map_err(|e| UpstreamError::InvalidResponse(format!("Invalid JSON: {e}")))?;

        if let Some(error) = response.error {
            return Err(UpstreamError::RpcError(error.code, error.message));
        }

        match response.result {
            Some(Value::Null) | None => Err(UpstreamError::EmptyResult),
            Some(value) => Ok(value),
        }
    }
}
