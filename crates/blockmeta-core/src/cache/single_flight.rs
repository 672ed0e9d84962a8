//! Keyed TTL cache with at most one in-flight fetch per key.
//!
//! Each key maps to a shared slot (`Arc<OnceCell<..>>`). The first caller to
//! find an empty slot runs the fetch; callers arriving while it runs wait on
//! the same cell and receive the same value. The map shard lock is only held
//! to look up or insert the slot, never while a fetch runs, so unrelated keys
//! never wait on each other.
//!
//! ```text
//! get_or_fetch(key)
//!       │
//!       ▼
//!  slot for key ──────────── completed & live ──► hit
//!       │                          │
//!       │                   completed & expired ──► evict slot, retry
//!       ▼
//!  get_or_init(fetch)
//!       │
//!       ├── we ran the fetch ──► miss
//!       └── waited on another caller ──► coalesced
//! ```
//!
//! Expiry is fixed at completion time plus the TTL chosen for the outcome
//! (value or absent); reads never extend it. Expired slots are replaced on the
//! next access to their key or dropped by [`SingleFlightTtlCache::purge_expired`].
//!
//! If the caller running a fetch is cancelled, the slot stays empty and the
//! next waiter runs its own fetch.

use crate::metrics;
use dashmap::DashMap;
use std::{
    future::Future,
    hash::Hash,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::OnceCell, time::Instant};

/// Lifetimes for a fetched value and for an absent outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    /// Lifetime of a successfully fetched value.
    pub value: Duration,
    /// Lifetime of an absent outcome (failed or empty fetch).
    pub absent: Duration,
}

impl CacheTtl {
    /// Same lifetime for values and absent outcomes.
    #[must_use]
    pub const fn uniform(ttl: Duration) -> Self {
        Self { value: ttl, absent: ttl }
    }

    #[must_use]
    pub const fn new(value: Duration, absent: Duration) -> Self {
        Self { value, absent }
    }
}

/// A finished fetch. `value` is `None` for the absent outcome.
#[derive(Debug)]
struct Completed<V> {
    value: Option<V>,
    expires_at: Instant,
}

impl<V> Completed<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

type Slot<V> = Arc<OnceCell<Completed<V>>>;

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a live entry.
    pub hits: u64,
    /// Lookups that ran the fetch.
    pub misses: u64,
    /// Lookups that waited on another caller's fetch.
    pub coalesced: u64,
    /// Slots currently held, including in-flight and expired ones.
    pub entries: usize,
}

/// Keyed cache with per-entry TTL and single-flight fetches.
pub struct SingleFlightTtlCache<K, V> {
    name: &'static str,
    slots: DashMap<K, Slot<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

impl<K, V> SingleFlightTtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache. `name` labels its metrics.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Returns the cache name used in metrics and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the cached value for `key`, running `fetch` only if there is no
    /// live entry and no fetch already in flight for the key.
    ///
    /// The fetch outcome is cached for `ttl.value` when it is `Some` and for
    /// `ttl.absent` when it is `None`. Every caller waiting on the same fetch
    /// gets the same outcome.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, ttl: CacheTtl, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<V>>,
    {
        let slot = loop {
            let slot = self.slot_for(&key);
            match slot.get() {
                Some(done) if done.is_live(Instant::now()) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    metrics::record_cache_lookup(self.name, metrics::CacheLookup::Hit);
                    return done.value.clone();
                }
                Some(_) => self.evict_if_current(&key, &slot),
                None => break slot,
            }
        };

        let ran_fetch = AtomicBool::new(false);
        let done = slot
            .get_or_init(|| async {
                ran_fetch.store(true, Ordering::Relaxed);
                let value = fetch().await;
                let lifetime = if value.is_some() { ttl.value } else { ttl.absent };
                Completed { value, expires_at: Instant::now() + lifetime }
            })
            .await;

        if ran_fetch.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_lookup(self.name, metrics::CacheLookup::Miss);
        } else {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_lookup(self.name, metrics::CacheLookup::Coalesced);
        }

        done.value.clone()
    }

    /// Returns the live value for `key` without fetching.
    ///
    /// The outer `Option` is `None` when there is no live completed entry; the
    /// inner one is the cached outcome.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<Option<V>> {
        let slot = self.slots.get(key)?.value().clone();
        let done = slot.get()?;
        done.is_live(Instant::now()).then(|| done.value.clone())
    }

    /// Drops the entry for `key` unless a fetch for it is in flight.
    pub fn invalidate(&self, key: &K) {
        self.slots.remove_if(key, |_, slot| slot.initialized());
    }

    /// Removes every completed entry whose TTL has elapsed.
    ///
    /// In-flight slots are kept. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.get().is_none_or(|done| done.is_live(now)));
        before.saturating_sub(self.slots.len())
    }

    /// Number of slots currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            entries: self.slots.len(),
        }
    }

    /// Gets or creates the slot for `key`, releasing the shard lock before returning.
    fn slot_for(&self, key: &K) -> Slot<V> {
        if let Some(existing) = self.slots.get(key) {
            return existing.value().clone();
        }
        self.slots.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())).value().clone()
    }

    /// Removes the expired `slot` unless another caller already replaced it.
    fn evict_if_current(&self, key: &K, slot: &Slot<V>) {
        self.slots.remove_if(key, |_, current| Arc::ptr_eq(current, slot));
    }
}
