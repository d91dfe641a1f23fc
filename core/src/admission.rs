//! Admission cache seam - advisory sold-out fast path.
//!
//! One signed counter per event, seeded to `rows × cols` at event creation
//! and decremented as bookings commit. The counter is a hint, never a proof:
//! a zero is a sufficient sold-out signal, a positive value proves nothing.
//! The coordinator only ever uses it to *skip* work, never to decide a commit.

use crate::types::EventId;
use crate::BoxFuture;
use thiserror::Error;

/// Failure talking to the admission cache.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("admission cache unavailable: {0}")]
pub struct AdmissionCacheError(pub String);

/// Per-event remaining-seats counter.
pub trait AdmissionCache: Send + Sync {
    /// Read the counter. `None` on absence *or* error - the caller skips the
    /// fast path either way rather than rejecting on a cache fault.
    fn peek(&self, event_id: EventId) -> BoxFuture<'_, Option<i64>>;

    /// Atomically subtract `delta`, clamping the stored value at zero.
    ///
    /// Implementations log the clamp anomaly; a negative observation means
    /// the counter drifted below the true remaining count.
    ///
    /// # Errors
    ///
    /// [`AdmissionCacheError`] on transport failure. Decrements are issued
    /// best-effort after a successful commit.
    fn decrement(&self, event_id: EventId, delta: i64) -> BoxFuture<'_, Result<(), AdmissionCacheError>>;

    /// Set the counter to `initial` with the configured key TTL.
    ///
    /// # Errors
    ///
    /// [`AdmissionCacheError`] on transport failure.
    fn seed(&self, event_id: EventId, initial: i64) -> BoxFuture<'_, Result<(), AdmissionCacheError>>;
}

/// Admission cache that is switched off.
///
/// Wired when `admissionCache.enabled` is false: every peek returns `None`,
/// so the coordinator always skips the fast path, and seeds/decrements are
/// accepted and dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledAdmissionCache;

impl AdmissionCache for DisabledAdmissionCache {
    fn peek(&self, _event_id: EventId) -> BoxFuture<'_, Option<i64>> {
        Box::pin(async { None })
    }

    fn decrement(
        &self,
        _event_id: EventId,
        _delta: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        Box::pin(async { Ok(()) })
    }

    fn seed(
        &self,
        _event_id: EventId,
        _initial: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        Box::pin(async { Ok(()) })
    }
}
