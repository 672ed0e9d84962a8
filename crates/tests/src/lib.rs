//! Integration Tests for Blockmeta
//!
//! This crate contains various test modules:
//!
//! - `enrichment_tests`: Batch enrichment, block time derivation and fetch deduplication
//! - `tip_height_tests`: Chain tip height lookups and their short-lived cache
//! - `failure_tests`: Timeouts, error replies and absent blocks
//! - `mock_infrastructure`: Reusable mock daemons and fixtures
//!
//! ## Running Tests
//!
//! No node is required; every daemon is a mockito server or a silent TCP
//! listener on loopback.
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod enrichment_tests;


#[cfg(test)]
mod tip_height_tests;
