//! Block metadata enrichment.
//!
//! [`BlockEnricher`] is the entry point. It owns two cached lookups against a
//! pool's node daemon:
//!
//! - [`TipHeightService`]: `eth_blockNumber`, keyed by pool id
//! - [`BlockMetadataService`]: `eth_getBlockByNumber`, keyed by daemon and height
//!
//! Both go through one [`RpcGateway`](crate::upstream::RpcGateway), which
//! refuses any daemon that is not on loopback.

pub mod builder;
pub mod enricher;
pub mod metadata;
pub mod tip;

pub use builder::{BlockEnricherBuilder, BuilderError};
pub use enricher::{BlockEnricher, EnrichmentStats};
pub use metadata::{BlockKey, BlockMetadata, BlockMetadataService};
pub use tip::TipHeightService;
