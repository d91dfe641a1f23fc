//! Seat store seam - durable, transactional source of truth for ownership.
//!
//! The seat store persists events and their seat grids. Seat mutation is
//! *not* exposed here: the commit strategies own the `status`/`holder`
//! transition exclusively (see [`crate::strategy`]); everything on this trait
//! is either creation-time materialization or read-only.

use crate::types::{Event, EventId, NewEvent, Seat, SeatPos};
use crate::BoxFuture;
use thiserror::Error;

/// Failure talking to the seat store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeatStoreError {
    /// Rejected creation parameters (non-positive grid dimensions).
    #[error("invalid event definition: {0}")]
    InvalidEvent(String),

    /// Network/server error or timeout.
    #[error("seat store unavailable: {0}")]
    Unavailable(String),
}

/// Durable event + seat persistence.
pub trait SeatStore: Send + Sync {
    /// Insert the event and materialize its `rows × cols` seat grid, all
    /// `AVAILABLE` with no holder, in a single transaction.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::InvalidEvent`] for non-positive dimensions,
    /// [`SeatStoreError::Unavailable`] on storage failure (nothing persisted).
    fn create_event(&self, spec: NewEvent) -> BoxFuture<'_, Result<Event, SeatStoreError>>;

    /// Look up an event by id.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] on storage failure.
    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<Event>, SeatStoreError>>;

    /// Ids of all known events, for the reconciler sweep.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] on storage failure.
    fn list_event_ids(&self) -> BoxFuture<'_, Result<Vec<EventId>, SeatStoreError>>;

    /// Fetch the named seats of an event. Seats that do not exist are simply
    /// absent from the result; no ordering is guaranteed.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] on storage failure.
    fn fetch_seats<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<Vec<Seat>, SeatStoreError>>;

    /// Positions of every seat of the event still `AVAILABLE`.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] on storage failure.
    fn fetch_available(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, SeatStoreError>>;

    /// Full seat grid of the event in creation (row-major) order, for the
    /// seat-map endpoint.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] on storage failure.
    fn seat_map(&self, event_id: EventId) -> BoxFuture<'_, Result<Vec<Seat>, SeatStoreError>>;

    /// Round-trip to the store, for readiness probes.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] when the store cannot be reached.
    fn ping(&self) -> BoxFuture<'_, Result<(), SeatStoreError>>;
}
