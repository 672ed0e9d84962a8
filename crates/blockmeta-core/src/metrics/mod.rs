//! # Metrics
//!
//! Enrichment records through the `metrics` facade. Nothing is exported from
//! this crate; the embedding process installs whatever recorder it uses and
//! every call here is a no-op until it does.
//!
//! | Name | Kind | Labels |
//! |------|------|--------|
//! | `blockmeta_rpc_requests_total` | counter | `method`, `outcome` |
//! | `blockmeta_rpc_request_duration_seconds` | histogram | `method` |
//! | `blockmeta_cache_lookups_total` | counter | `cache`, `result` |
//! | `blockmeta_enrichment_blocks_total` | counter | `pool` |
//! | `blockmeta_enrichment_duration_seconds` | histogram | `pool` |
//!
//! Pool ids are interned so repeated enrichment of the same pool does not
//! allocate label strings. The set of pools is fixed by configuration, so the
//! interned set stays small.

use metrics::{counter, histogram};
use std::{borrow::Cow, sync::OnceLock, time::Duration};

static POOL_LABELS: OnceLock<dashmap::DashMap<String, &'static str>> = OnceLock::new();

#[inline]
fn pool_to_static(pool: &str) -> Cow<'static, str> {
    let labels = POOL_LABELS.get_or_init(dashmap::DashMap::new);

    if let Some(interned) = labels.get(pool) {
        return Cow::Borrowed(*interned);
    }

    let owned = pool.to_string();
    let leaked: &'static str = Box::leak(owned.clone().into_boxed_str());
    labels.insert(owned, leaked);
    Cow::Borrowed(leaked)
}

/// How a cache lookup was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    /// Served from a live entry.
    Hit,
    /// Ran the fetch.
    Miss,
    /// Waited on a fetch another caller started.
    Coalesced,
}

impl CacheLookup {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Coalesced => "coalesced",
        }
    }
}

/// Records one daemon call. `outcome` is `"success"` or an error class.
pub fn record_rpc_request(method: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!("blockmeta_rpc_requests_total", "method" => method, "outcome" => outcome).increment(1);
    if !elapsed.is_zero() {
        histogram!("blockmeta_rpc_request_duration_seconds", "method" => method).record(elapsed.as_secs_f64());
    }
}

/// Records one cache lookup.
pub fn record_cache_lookup(cache: &'static str, result: CacheLookup) {
    counter!("blockmeta_cache_lookups_total", "cache" => cache, "result" => result.as_str()).increment(1);
}

/// Records one enrichment pass over `blocks` blocks of `pool`.
pub fn record_enrichment(pool: &str, blocks: usize, elapsed: Duration) {
    let pool = pool_to_static(pool);
    counter!("blockmeta_enrichment_blocks_total", "pool" => pool.clone()).increment(blocks as u64);
    histogram!("blockmeta_enrichment_duration_seconds", "pool" => pool).record(elapsed.as_secs_f64());
}
