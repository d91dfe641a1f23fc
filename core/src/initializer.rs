//! Event initializer - materializes an event and seeds its admission counter.

use crate::admission::AdmissionCache;
use crate::seat_store::{SeatStore, SeatStoreError};
use crate::types::{Event, NewEvent};
use std::sync::Arc;
use tracing::{info, warn};

/// Creates events: one seat-store transaction for the event and its grid,
/// then a best-effort admission-counter seed.
pub struct EventInitializer {
    seat_store: Arc<dyn SeatStore>,
    admission: Arc<dyn AdmissionCache>,
}

impl EventInitializer {
    /// Wire an initializer.
    #[must_use]
    pub fn new(seat_store: Arc<dyn SeatStore>, admission: Arc<dyn AdmissionCache>) -> Self {
        Self {
            seat_store,
            admission,
        }
    }

    /// Create the event, its `rows × cols` seat grid, and its admission
    /// counter.
    ///
    /// The event and grid are one transaction in the seat store; a failure
    /// there persists nothing. The counter seed afterwards is best-effort;
    /// if it fails, peeks return absent and bookings simply skip the fast
    /// path for this event.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::InvalidEvent`] for a blank name or non-positive
    /// dimensions, [`SeatStoreError::Unavailable`] on storage failure.
    pub async fn create_event(&self, spec: NewEvent) -> Result<Event, SeatStoreError> {
        if spec.name.trim().is_empty() {
            return Err(SeatStoreError::InvalidEvent(
                "event name must not be empty".into(),
            ));
        }
        if spec.rows < 1 || spec.cols < 1 {
            return Err(SeatStoreError::InvalidEvent(format!(
                "grid dimensions must be at least 1x1, got {}x{}",
                spec.rows, spec.cols
            )));
        }

        let event = self.seat_store.create_event(spec).await?;
        let total = event.total_seats();

        if let Err(err) = self.admission.seed(event.id, total).await {
            warn!(
                event_id = %event.id,
                error = %err,
                "Admission counter seed failed, fast path disabled for this event"
            );
        }

        info!(
            event_id = %event.id,
            rows = event.rows,
            cols = event.cols,
            total_seats = total,
            "Event created"
        );
        Ok(event)
    }
}
