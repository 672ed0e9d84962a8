//! Tests for the single-flight TTL cache.
//!
//! Organized by behavior: fetch coalescing and cancellation in
//! `single_flight_tests`, TTL and sweeping in `expiry_tests`.

use crate::cache::{CacheTtl, SingleFlightTtlCache};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::time::Duration;

// ============================================================================
// Shared Test Helpers
// ============================================================================

/// Creates an empty shared cache keyed by height.
pub(crate) fn create_test_cache() -> Arc<SingleFlightTtlCache<u64, u64>> {
    Arc::new(SingleFlightTtlCache::new("test"))
}

/// Values live for 3s, absent outcomes for 1s.
pub(crate) fn test_ttl() -> CacheTtl {
    CacheTtl::new(Duration::from_secs(3), Duration::from_secs(1))
}

/// Fetches `value` and counts the call.
pub(crate) async fn counted(fetches: &AtomicUsize, value: Option<u64>) -> Option<u64> {
    fetches.fetch_add(1, Ordering::SeqCst);
    value
}
