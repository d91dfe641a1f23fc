//! In-memory lock store.
//!
//! A single mutex over the claim maps makes `try_claim` linearizable the same
//! way the Lua script does in production: the existence check and the insert
//! happen under one critical section.

use chrono::{DateTime, Duration, Utc};
use seatgrid_core::lock_store::{LockStore, LockStoreError};
use seatgrid_core::types::{EventId, SeatPos};
use seatgrid_core::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mutex-serialized claim maps with call counters and failure injection.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    claims: Mutex<HashMap<EventId, HashMap<String, DateTime<Utc>>>>,
    /// Number of `try_claim` calls observed.
    pub claim_calls: AtomicUsize,
    /// Number of `release` calls observed.
    pub release_calls: AtomicUsize,
    /// Number of `scan_stale` calls observed.
    pub scan_calls: AtomicUsize,
    fail_claims: AtomicBool,
    fail_releases: AtomicBool,
}

impl InMemoryLockStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `try_claim` fail as unavailable.
    pub fn set_fail_claims(&self, fail: bool) {
        self.fail_claims.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `release` fail as unavailable.
    pub fn set_fail_releases(&self, fail: bool) {
        self.fail_releases.store(fail, Ordering::SeqCst);
    }

    /// Field keys currently claimed for an event, sorted for stable asserts.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn claimed_fields(&self, event_id: EventId) -> Vec<String> {
        let claims = self.claims.lock().expect("lock store lock poisoned");
        let mut fields: Vec<String> = claims
            .get(&event_id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        fields.sort();
        fields
    }

    /// Number of claimed fields for an event.
    #[must_use]
    pub fn claim_count(&self, event_id: EventId) -> usize {
        self.claimed_fields(event_id).len()
    }
}

impl LockStore for InMemoryLockStore {
    fn try_claim<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<bool, LockStoreError>> {
        Box::pin(async move {
            self.claim_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_claims.load(Ordering::SeqCst) {
                return Err(LockStoreError::Unavailable("injected claim failure".into()));
            }

            let mut claims = self.claims.lock().expect("lock store lock poisoned");
            let entry = claims.entry(event_id).or_default();
            if seats.iter().any(|pos| entry.contains_key(&pos.field_key())) {
                return Ok(false);
            }
            for pos in seats {
                entry.insert(pos.field_key(), now);
            }
            Ok(true)
        })
    }

    fn release<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<usize, LockStoreError>> {
        Box::pin(async move {
            self.release_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_releases.load(Ordering::SeqCst) {
                return Err(LockStoreError::Unavailable(
                    "injected release failure".into(),
                ));
            }

            let mut claims = self.claims.lock().expect("lock store lock poisoned");
            let Some(entry) = claims.get_mut(&event_id) else {
                return Ok(0);
            };
            let mut removed = 0;
            for pos in seats {
                if entry.remove(&pos.field_key()).is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn scan_stale(
        &self,
        event_id: EventId,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, LockStoreError>> {
        Box::pin(async move {
            self.scan_calls.fetch_add(1, Ordering::SeqCst);
            let claims = self.claims.lock().expect("lock store lock poisoned");
            let cutoff = now - threshold;
            let stale = claims
                .get(&event_id)
                .map(|entry| {
                    entry
                        .iter()
                        .filter(|(_, claimed_at)| **claimed_at < cutoff)
                        .filter_map(|(field, _)| SeatPos::from_field_key(field))
                        .collect()
                })
                .unwrap_or_default();
            Ok(stale)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), LockStoreError>> {
        Box::pin(async { Ok(()) })
    }
}
