//! In-memory caches for enrichment lookups.
//!
//! Both enrichment caches are instances of one structure:
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │              SingleFlightTtlCache<K, V>            │
//! │  DashMap<K, Arc<OnceCell<Completed<V>>>>           │
//! │                                                    │
//! │  • one fetch in flight per key                     │
//! │  • TTL fixed at completion, never refreshed        │
//! │  • absent outcomes cached with their own TTL       │
//! └────────────────────────────────────────────────────┘
//!          │                               │
//!   tip heights (pool id, 3s)     block metadata (endpoint + height, 10min)
//! ```
//!
//! Lookups replace expired entries lazily. [`background::spawn_expiry_sweep`]
//! drops expired entries for keys that are never looked up again.

pub mod background;
pub mod single_flight;

pub use single_flight::{CacheStats, CacheTtl, SingleFlightTtlCache};

#[cfg(test)]
mod tests;
