//! Reconciler - releases lock-store claims stranded by crashed bookings.
//!
//! A claim whose owning booking died between Gatekeeper and commit is a
//! *ghost*: the lock store says "claimed" while the seat store still says
//! `AVAILABLE`. The sweep finds claims old enough to rule out an in-flight
//! booking, intersects them with the still-available seats, and releases the
//! intersection. It never touches the seat store and never releases a claim
//! whose seat is `BOOKED`, so it cannot cause double-booking.
//!
//! This type computes a single sweep; the long-running timer task that drives
//! it lives with the server composition.

use crate::clock::Clock;
use crate::lock_store::{LockStore, LockStoreError};
use crate::seat_store::{SeatStore, SeatStoreError};
use crate::types::{EventId, SeatPos};
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure during a sweep of one event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SweepError {
    /// Seat store could not be read.
    #[error(transparent)]
    SeatStore(#[from] SeatStoreError),

    /// Lock store could not be read or written.
    #[error(transparent)]
    LockStore(#[from] LockStoreError),
}

/// Result of sweeping a single event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventSweep {
    /// Claims older than the stale threshold.
    pub stale: usize,
    /// Ghost claims actually removed.
    pub released: usize,
}

/// Aggregate result of sweeping every known event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Events visited.
    pub events: usize,
    /// Events whose sweep failed (logged and skipped).
    pub failed: usize,
    /// Stale claims seen across all events.
    pub stale: usize,
    /// Ghost claims released across all events.
    pub released: usize,
}

/// Periodic ghost-claim cleanup over the seat and lock stores.
pub struct Reconciler {
    seat_store: Arc<dyn SeatStore>,
    lock_store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    stale_threshold: Duration,
}

impl Reconciler {
    /// Wire a reconciler. `stale_threshold` must exceed the worst-case
    /// commit-plus-compensation latency, or in-flight bookings would be swept.
    #[must_use]
    pub fn new(
        seat_store: Arc<dyn SeatStore>,
        lock_store: Arc<dyn LockStore>,
        clock: Arc<dyn Clock>,
        stale_threshold: Duration,
    ) -> Self {
        Self {
            seat_store,
            lock_store,
            clock,
            stale_threshold,
        }
    }

    /// Sweep one event: release every claim that is both stale and still
    /// `AVAILABLE` in the seat store.
    ///
    /// # Errors
    ///
    /// [`SweepError`] when either store fails; nothing is released in that
    /// case and the next sweep retries from scratch.
    pub async fn sweep_event(&self, event_id: EventId) -> Result<EventSweep, SweepError> {
        let now = self.clock.now();
        let stale = self
            .lock_store
            .scan_stale(event_id, self.stale_threshold, now)
            .await?;
        if stale.is_empty() {
            return Ok(EventSweep::default());
        }
        let stale_count = stale.len();

        let available: HashSet<String> = self
            .seat_store
            .fetch_available(event_id)
            .await?
            .iter()
            .map(SeatPos::field_key)
            .collect();

        // Stale ∩ available: claims old enough to be dead whose seats were
        // never sold. Stale claims over BOOKED seats are left in place.
        let ghosts: Vec<SeatPos> = stale
            .into_iter()
            .filter(|pos| available.contains(&pos.field_key()))
            .collect();

        if ghosts.is_empty() {
            debug!(
                event_id = %event_id,
                stale = stale_count,
                "Stale claims all correspond to booked seats, nothing to release"
            );
            return Ok(EventSweep {
                stale: stale_count,
                released: 0,
            });
        }

        let released = self.lock_store.release(event_id, &ghosts).await?;
        info!(
            event_id = %event_id,
            stale = stale_count,
            released,
            "Released ghost claims"
        );
        Ok(EventSweep {
            stale: stale_count,
            released,
        })
    }

    /// Sweep every known event. Per-event failures are logged and skipped so
    /// one unreachable event cannot stall cleanup of the rest.
    pub async fn sweep_all(&self) -> SweepStats {
        let event_ids = match self.seat_store.list_event_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "Reconciler could not list events, skipping sweep");
                return SweepStats {
                    failed: 1,
                    ..SweepStats::default()
                };
            }
        };

        let mut stats = SweepStats::default();
        for event_id in event_ids {
            stats.events += 1;
            match self.sweep_event(event_id).await {
                Ok(sweep) => {
                    stats.stale += sweep.stale;
                    stats.released += sweep.released;
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(event_id = %event_id, error = %err, "Event sweep failed");
                }
            }
        }
        stats
    }
}
