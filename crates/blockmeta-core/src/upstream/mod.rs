//! Outbound calls to a pool's node daemon.
//!
//! - [`trust`]: loopback-only host policy, checked before any network activity
//! - [`deadline`]: caller deadline intersected with per-operation timeouts
//! - [`http_client`]: concurrency-limited, deadline-bounded HTTP POST transport
//! - [`gateway`]: JSON-RPC 2.0 envelope, response classification
//! - [`errors`]: the [`UpstreamError`] outcome taxonomy
//!
//! ```text
//! RpcGateway::call
//!     │
//!     ├─ host not loopback ──► HostNotPermitted (no request sent)
//!     │
//!     ▼
//! HttpClient::send_request ── deadline ──► Timeout
//!     │
//!     ├─ non-2xx / transport ──► HttpError / ConnectionFailed
//!     ▼
//! JSON-RPC reply ── error object ──► RpcError
//!     │
//!     ├─ null result ──► EmptyResult
//!     ▼
//!  result value
//! ```

pub mod deadline;
pub mod errors;
pub mod gateway;
pub mod http_client;
pub mod trust;

pub use deadline::Deadline;
pub use errors::UpstreamError;
pub use gateway::RpcGateway;
pub use http_client::{HttpClient, HttpClientConfig};
pub use trust::is_loopback_host;
