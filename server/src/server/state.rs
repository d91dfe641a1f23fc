//! Application state shared across HTTP handlers.

use seatgrid_core::coordinator::BookingCoordinator;
use seatgrid_core::initializer::EventInitializer;
use seatgrid_core::lock_store::LockStore;
use seatgrid_core::seat_store::SeatStore;
use std::sync::Arc;

/// Shared handler dependencies, cloned cheaply (all `Arc`s) per request.
///
/// Handlers see the stores through their seam traits, so tests back the same
/// router with in-memory stores.
#[derive(Clone)]
pub struct AppState {
    /// Seat store, for the seat-map endpoint and readiness.
    pub seat_store: Arc<dyn SeatStore>,
    /// Lock store, for readiness.
    pub lock_store: Arc<dyn LockStore>,
    /// The booking pipeline.
    pub coordinator: Arc<BookingCoordinator>,
    /// Event creation.
    pub initializer: Arc<EventInitializer>,
}

impl AppState {
    /// Assemble the state from its composed parts.
    #[must_use]
    pub fn new(
        seat_store: Arc<dyn SeatStore>,
        lock_store: Arc<dyn LockStore>,
        coordinator: Arc<BookingCoordinator>,
        initializer: Arc<EventInitializer>,
    ) -> Self {
        Self {
            seat_store,
            lock_store,
            coordinator,
            initializer,
        }
    }
}
