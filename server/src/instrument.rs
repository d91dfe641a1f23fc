//! Metric decorators for the lock store and admission cache.
//!
//! The store implementations stay observability-free; these wrappers record
//! the counters and are wired around them at composition time, so the core
//! pipeline can be tested without a metrics recorder installed.

use chrono::{DateTime, Duration, Utc};
use seatgrid_core::admission::{AdmissionCache, AdmissionCacheError};
use seatgrid_core::lock_store::{LockStore, LockStoreError};
use seatgrid_core::types::{EventId, SeatPos};
use seatgrid_core::BoxFuture;
use std::sync::Arc;

use crate::metrics::{record_admission_peek, record_gatekeeper_claim};

/// Lock store wrapper counting Gatekeeper claim outcomes.
pub struct InstrumentedLockStore {
    inner: Arc<dyn LockStore>,
}

impl InstrumentedLockStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn LockStore>) -> Self {
        Self { inner }
    }
}

impl LockStore for InstrumentedLockStore {
    fn try_claim<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<bool, LockStoreError>> {
        Box::pin(async move {
            let result = self.inner.try_claim(event_id, seats, now).await;
            match &result {
                Ok(true) => record_gatekeeper_claim("granted"),
                Ok(false) => record_gatekeeper_claim("rejected"),
                Err(_) => record_gatekeeper_claim("error"),
            }
            result
        })
    }

    fn release<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<usize, LockStoreError>> {
        self.inner.release(event_id, seats)
    }

    fn scan_stale(
        &self,
        event_id: EventId,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, LockStoreError>> {
        self.inner.scan_stale(event_id, threshold, now)
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), LockStoreError>> {
        self.inner.ping()
    }
}

/// Admission cache wrapper counting fast-path reads.
pub struct InstrumentedAdmissionCache {
    inner: Arc<dyn AdmissionCache>,
}

impl InstrumentedAdmissionCache {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn AdmissionCache>) -> Self {
        Self { inner }
    }
}

impl AdmissionCache for InstrumentedAdmissionCache {
    fn peek(&self, event_id: EventId) -> BoxFuture<'_, Option<i64>> {
        Box::pin(async move {
            let value = self.inner.peek(event_id).await;
            record_admission_peek(if value.is_some() { "hit" } else { "miss" });
            value
        })
    }

    fn decrement(
        &self,
        event_id: EventId,
        delta: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        self.inner.decrement(event_id, delta)
    }

    fn seed(
        &self,
        event_id: EventId,
        initial: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        self.inner.seed(event_id, initial)
    }
}
