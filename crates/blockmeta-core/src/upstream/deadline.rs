//! Caller-supplied deadlines.
//!
//! Every public entry point takes a [`Deadline`]. Each outbound call runs until
//! the earlier of that deadline and its own operation timeout, measured from
//! the moment the call holds a connection slot. Waiting for a slot is bounded
//! by the deadline alone. Dropping the returned future cancels the call.

use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which the caller no longer wants a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No caller deadline; only per-operation timeouts apply.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Deadline at a fixed instant.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// Returns the caller deadline, if any.
    #[must_use]
    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Returns the earlier of the caller deadline and `now + timeout`.
    #[must_use]
    pub fn bounded_by(&self, timeout: Duration) -> Instant {
        let operation = Instant::now() + timeout;
        match self.0 {
            Some(caller) => caller.min(operation),
            None => operation,
        }
    }

    /// Returns `true` once the caller deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|d| Instant::now() >= d)
    }
}
