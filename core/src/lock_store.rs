//! Lock store seam - the Gatekeeper's atomic primitive.
//!
//! The lock store keeps one map per event, from seat field key (`"row-col"`)
//! to claim timestamp. Presence of a field means "some coordinator has claimed
//! this seat". The whole safety argument of the booking pipeline rests on
//! [`LockStore::try_claim`] being atomic over the full requested set: between
//! its existence check and its insert, no other `try_claim`, `release` or
//! `scan_stale` on the same event may interleave. Implementations must realize
//! this with a server-side scripting or transactional primitive; emulating it
//! with two client round-trips is incorrect.

use crate::types::{EventId, SeatPos};
use crate::BoxFuture;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Failure talking to the lock store.
///
/// Deliberately a single transient kind: an ambiguous `try_claim` must be
/// treated as "claim failed" - the coordinator never proceeds to commit after
/// one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockStoreError {
    /// Network/server error or timeout.
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

/// Atomic per-event seat claims.
pub trait LockStore: Send + Sync {
    /// Claim every seat in `seats` for one coordinator, all or nothing.
    ///
    /// Returns `Ok(true)` and records `now` against every field if none of
    /// them existed; returns `Ok(false)` and writes nothing if any field was
    /// already present. Attaches the key-level TTL when the event map is
    /// created.
    ///
    /// # Errors
    ///
    /// [`LockStoreError::Unavailable`] on any transport or server failure,
    /// including ambiguous outcomes.
    fn try_claim<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<bool, LockStoreError>>;

    /// Delete the listed fields. Missing fields are ignored.
    ///
    /// Returns the number of fields actually removed, which makes repeated
    /// release idempotent and observable.
    ///
    /// # Errors
    ///
    /// [`LockStoreError::Unavailable`] on transport failure. Callers treat
    /// release as best-effort; the reconciler is the backstop.
    fn release<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<usize, LockStoreError>>;

    /// List fields whose claim timestamp is older than `now - threshold`.
    ///
    /// # Errors
    ///
    /// [`LockStoreError::Unavailable`] on transport failure.
    fn scan_stale(
        &self,
        event_id: EventId,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, LockStoreError>>;

    /// Round-trip to the store, for readiness probes.
    ///
    /// # Errors
    ///
    /// [`LockStoreError::Unavailable`] when the store cannot be reached.
    fn ping(&self) -> BoxFuture<'_, Result<(), LockStoreError>>;
}
