//! In-memory admission counter.

use seatgrid_core::admission::{AdmissionCache, AdmissionCacheError};
use seatgrid_core::types::EventId;
use seatgrid_core::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Counter map with the same clamp-at-zero semantics as the Redis cache.
#[derive(Debug, Default)]
pub struct InMemoryAdmissionCache {
    counters: Mutex<HashMap<EventId, i64>>,
    /// Number of `peek` calls observed.
    pub peek_calls: AtomicUsize,
    /// Number of `decrement` calls observed.
    pub decrement_calls: AtomicUsize,
    fail_peeks: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryAdmissionCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `peek` behave as a cache fault (absent).
    pub fn set_fail_peeks(&self, fail: bool) {
        self.fail_peeks.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `seed`/`decrement` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current counter value, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn value(&self, event_id: EventId) -> Option<i64> {
        let counters = self.counters.lock().expect("admission lock poisoned");
        counters.get(&event_id).copied()
    }
}

impl AdmissionCache for InMemoryAdmissionCache {
    fn peek(&self, event_id: EventId) -> BoxFuture<'_, Option<i64>> {
        Box::pin(async move {
            self.peek_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_peeks.load(Ordering::SeqCst) {
                return None;
            }
            let counters = self.counters.lock().expect("admission lock poisoned");
            counters.get(&event_id).copied()
        })
    }

    fn decrement(
        &self,
        event_id: EventId,
        delta: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        Box::pin(async move {
            self.decrement_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AdmissionCacheError("injected write failure".into()));
            }
            let mut counters = self.counters.lock().expect("admission lock poisoned");
            // Absent counters stay absent, matching the production cache: a
            // decrement never resurrects an expired key.
            if let Some(value) = counters.get_mut(&event_id) {
                *value = (*value - delta).max(0);
            }
            Ok(())
        })
    }

    fn seed(
        &self,
        event_id: EventId,
        initial: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AdmissionCacheError("injected write failure".into()));
            }
            let mut counters = self.counters.lock().expect("admission lock poisoned");
            counters.insert(event_id, initial);
            Ok(())
        })
    }
}
