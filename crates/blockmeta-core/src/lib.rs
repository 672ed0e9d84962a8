//! # Blockmeta Core
//!
//! Enriches mining pool block records with metadata from the pool's own
//! Ethereum node.
//!
//! This crate provides:
//!
//! - **[`enrichment`]**: the two entry points, batch block enrichment and chain
//!   tip height, plus the services behind them.
//!
//! - **[`cache`]**: keyed TTL cache with one in-flight fetch per key.
//!
//! - **[`upstream`]**: JSON-RPC calls to loopback daemons under a deadline.
//!
//! - **[`utils`]**: sign-safe decoding of hex quantities.
//!
//! - **[`config`]**: layered TOML and environment configuration.
//!
//! - **[`metrics`]**: counters and histograms via the `metrics` facade.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      BlockEnricher                       │
//! │  ┌──────────────────┐        ┌────────────────────────┐  │
//! │  │ TipHeightService │        │  BlockMetadataService  │  │
//! │  │  cache: pool id  │        │ cache: daemon + height │  │
//! │  │  ttl: 3s         │        │ ttl: 10min             │  │
//! │  └────────┬─────────┘        └───────────┬────────────┘  │
//! │           └──────────────┬───────────────┘               │
//! │                 ┌────────▼────────┐                      │
//! │                 │   RpcGateway    │ loopback only        │
//! │                 └────────┬────────┘                      │
//! └──────────────────────────┼───────────────────────────────┘
//!                            ▼
//!                     node daemon (JSON-RPC)
//! ```
//!
//! ## Enrichment Flow
//!
//! ```text
//! blocks (heights 100, 101)
//!       │
//!       ▼
//! heights ∪ predecessors = {99, 100, 101}
//!       │
//!       ▼
//! ┌─────────────┐
//! │ Cache Check │ ─── Hit ──► cached metadata
//! └──────┬──────┘
//!        │ Miss (one fetch per height, concurrent)
//!        ▼
//! eth_getBlockByNumber(0x.., false)
//!        │
//!        ▼
//! merge onto blocks, block time = ts(h) - ts(h-1) when ≥ 0
//! ```

pub mod cache;
pub mod config;
pub mod enrichment;
pub mod metrics;
pub mod types;
pub mod upstream;
pub mod utils;
