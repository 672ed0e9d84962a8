use thiserror::Error;

/// Outcome of a failed call to a node daemon.
///
/// Callers inside the crate thread this through `Result`; the public entry
/// points turn every variant into "absent" after logging it once.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The daemon host is not a loopback address; no request was sent.
    #[error("Host not permitted: {0}")]
    HostNotPermitted(String),

    /// The caller deadline or the per-operation timeout elapsed.
    #[error("Request timeout")]
    Timeout,

    /// Failed to reach the daemon.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP-level error occurred (non-2xx status code).
    ///
    /// First field is the HTTP status code, second is the (truncated) body.
    #[error("HTTP error: {0}")]
    HttpError(u16, String),

    /// JSON-RPC error object returned by the daemon.
    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    /// Response body was not a valid JSON-RPC reply.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The reply carried a `null` or missing `result`.
    #[error("Empty result")]
    EmptyResult,

    /// The request could not be built (bad URL, unserializable params).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No outbound permit became available in time.
    #[error("Concurrency limit reached: {0}")]
    ConcurrencyLimit(String),
}

impl UpstreamError {
    /// Returns `true` for the trust-policy refusal, which is reported separately
    /// from network failures.
    #[must_use]
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::HostNotPermitted(_))
    }

    /// Returns `true` if the daemon answered but had nothing for the request.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }

    /// Returns a static label for metrics.
    #[must_use]
    pub fn as_metric_str(&self) -> &'static str {
        match self {
            Self::HostNotPermitted(_) => "not_permitted",
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::HttpError(_, _) => "http_error",
            Self::RpcError(_, _) => "rpc_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::EmptyResult => "empty_result",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ConcurrencyLimit(_) => "concurrency_limit",
        }
    }
}
