//! In-memory seat store and the commit strategy over it.
//!
//! One mutex guards each event's grid, so the strategy's check-then-book is
//! as atomic as a database transaction. The store counts read calls so tests
//! can prove a fast-path rejection never consulted the source of truth.

use chrono::Utc;
use seatgrid_core::seat_store::{SeatStore, SeatStoreError};
use seatgrid_core::strategy::{CommitError, CommitStrategy};
use seatgrid_core::types::{Event, EventId, NewEvent, Seat, SeatId, SeatPos, SeatStatus};
use seatgrid_core::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
struct SeatCell {
    id: SeatId,
    pos: SeatPos,
    status: SeatStatus,
    holder: Option<String>,
}

#[derive(Clone, Debug)]
struct EventEntry {
    event: Event,
    // Creation (row-major) order, like the database grid.
    seats: Vec<SeatCell>,
}

/// Mutex-guarded seat grids with generated 64-bit ids.
#[derive(Debug, Default)]
pub struct InMemorySeatStore {
    inner: Mutex<HashMap<EventId, EventEntry>>,
    next_event_id: AtomicI64,
    next_seat_id: AtomicI64,
    /// Read calls observed across all query methods.
    pub read_calls: AtomicUsize,
}

impl InMemorySeatStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status and holder of one seat, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn seat_state(&self, event_id: EventId, pos: &SeatPos) -> Option<(SeatStatus, Option<String>)> {
        let inner = self.inner.lock().expect("seat store lock poisoned");
        inner.get(&event_id).and_then(|entry| {
            entry
                .seats
                .iter()
                .find(|cell| cell.pos == *pos)
                .map(|cell| (cell.status, cell.holder.clone()))
        })
    }

    /// Positions currently booked, sorted for stable asserts.
    #[must_use]
    pub fn booked_positions(&self, event_id: EventId) -> Vec<SeatPos> {
        let inner = self.inner.lock().expect("seat store lock poisoned");
        let mut booked: Vec<SeatPos> = inner
            .get(&event_id)
            .map(|entry| {
                entry
                    .seats
                    .iter()
                    .filter(|cell| cell.status == SeatStatus::Booked)
                    .map(|cell| cell.pos.clone())
                    .collect()
            })
            .unwrap_or_default();
        booked.sort();
        booked
    }

    /// Number of booked seats.
    #[must_use]
    pub fn booked_count(&self, event_id: EventId) -> usize {
        self.booked_positions(event_id).len()
    }

    /// Check-then-book under one lock; the commit strategy's transaction.
    pub(crate) fn commit_booking(
        &self,
        event_id: EventId,
        user_id: &str,
        seats: &[SeatPos],
    ) -> Result<(), CommitError> {
        let mut inner = self.inner.lock().expect("seat store lock poisoned");
        let entry = inner.get_mut(&event_id).ok_or(CommitError::SeatsNotFound)?;

        let mut indices = Vec::with_capacity(seats.len());
        for pos in seats {
            let idx = entry
                .seats
                .iter()
                .position(|cell| cell.pos == *pos)
                .ok_or(CommitError::SeatsNotFound)?;
            if entry.seats[idx].status == SeatStatus::Booked {
                return Err(CommitError::SeatsUnavailable);
            }
            indices.push(idx);
        }
        for idx in indices {
            entry.seats[idx].status = SeatStatus::Booked;
            entry.seats[idx].holder = Some(user_id.to_string());
        }
        Ok(())
    }

    fn cell_to_seat(event_id: EventId, cell: &SeatCell) -> Seat {
        Seat {
            id: cell.id,
            event_id,
            pos: cell.pos.clone(),
            status: cell.status,
            holder: cell.holder.clone(),
        }
    }
}

impl SeatStore for InMemorySeatStore {
    fn create_event(&self, spec: NewEvent) -> BoxFuture<'_, Result<Event, SeatStoreError>> {
        Box::pin(async move {
            if spec.rows < 1 || spec.cols < 1 {
                return Err(SeatStoreError::InvalidEvent(format!(
                    "grid dimensions must be at least 1x1, got {}x{}",
                    spec.rows, spec.cols
                )));
            }

            let event_id = EventId::new(self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1);
            let event = Event {
                id: event_id,
                name: spec.name,
                date: spec.date,
                rows: spec.rows,
                cols: spec.cols,
            };

            let mut seats = Vec::with_capacity((spec.rows * spec.cols) as usize);
            for row in 1..=spec.rows {
                for col in 1..=spec.cols {
                    seats.push(SeatCell {
                        id: SeatId::new(self.next_seat_id.fetch_add(1, Ordering::SeqCst) + 1),
                        pos: SeatPos::new(row.to_string(), col.to_string()),
                        status: SeatStatus::Available,
                        holder: None,
                    });
                }
            }

            let mut inner = self.inner.lock().expect("seat store lock poisoned");
            inner.insert(event_id, EventEntry {
                event: event.clone(),
                seats,
            });
            Ok(event)
        })
    }

    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<Event>, SeatStoreError>> {
        Box::pin(async move {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            let inner = self.inner.lock().expect("seat store lock poisoned");
            Ok(inner.get(&event_id).map(|entry| entry.event.clone()))
        })
    }

    fn list_event_ids(&self) -> BoxFuture<'_, Result<Vec<EventId>, SeatStoreError>> {
        Box::pin(async move {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            let inner = self.inner.lock().expect("seat store lock poisoned");
            let mut ids: Vec<EventId> = inner.keys().copied().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn fetch_seats<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<Vec<Seat>, SeatStoreError>> {
        Box::pin(async move {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            let inner = self.inner.lock().expect("seat store lock poisoned");
            let found = inner
                .get(&event_id)
                .map(|entry| {
                    entry
                        .seats
                        .iter()
                        .filter(|cell| seats.contains(&cell.pos))
                        .map(|cell| Self::cell_to_seat(event_id, cell))
                        .collect()
                })
                .unwrap_or_default();
            Ok(found)
        })
    }

    fn fetch_available(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, SeatStoreError>> {
        Box::pin(async move {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            let inner = self.inner.lock().expect("seat store lock poisoned");
            let available = inner
                .get(&event_id)
                .map(|entry| {
                    entry
                        .seats
                        .iter()
                        .filter(|cell| cell.status == SeatStatus::Available)
                        .map(|cell| cell.pos.clone())
                        .collect()
                })
                .unwrap_or_default();
            Ok(available)
        })
    }

    fn seat_map(&self, event_id: EventId) -> BoxFuture<'_, Result<Vec<Seat>, SeatStoreError>> {
        Box::pin(async move {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            let inner = self.inner.lock().expect("seat store lock poisoned");
            let seats = inner
                .get(&event_id)
                .map(|entry| {
                    entry
                        .seats
                        .iter()
                        .map(|cell| Self::cell_to_seat(event_id, cell))
                        .collect()
                })
                .unwrap_or_default();
            Ok(seats)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), SeatStoreError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Commit strategy over [`InMemorySeatStore`] with failure and panic
/// injection for compensation tests.
pub struct InMemoryCommitStrategy {
    store: Arc<InMemorySeatStore>,
    /// Number of commit attempts observed.
    pub commit_calls: AtomicUsize,
    fail_next: Mutex<Option<CommitError>>,
    panic_next: AtomicBool,
}

impl InMemoryCommitStrategy {
    /// Strategy writing into `store`.
    #[must_use]
    pub fn new(store: Arc<InMemorySeatStore>) -> Self {
        Self {
            store,
            commit_calls: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
            panic_next: AtomicBool::new(false),
        }
    }

    /// Make the next commit fail with `err` without touching the store.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_next_with(&self, err: CommitError) {
        *self.fail_next.lock().expect("strategy lock poisoned") = Some(err);
    }

    /// Make the next commit panic, simulating a bug in the strategy.
    pub fn panic_on_next_commit(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }
}

impl CommitStrategy for InMemoryCommitStrategy {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn commit<'a>(
        &'a self,
        event_id: EventId,
        user_id: &'a str,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<(), CommitError>> {
        Box::pin(async move {
            self.commit_calls.fetch_add(1, Ordering::SeqCst);
            assert!(!seats.is_empty(), "coordinator must not commit empty sets");
            if self.panic_next.swap(false, Ordering::SeqCst) {
                panic!("injected commit panic at {}", Utc::now());
            }
            if let Some(err) = self.fail_next.lock().expect("strategy lock poisoned").take() {
                return Err(err);
            }
            self.store.commit_booking(event_id, user_id, seats)
        })
    }
}
