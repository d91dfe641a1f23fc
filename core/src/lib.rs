//! Core booking pipeline for SeatGrid.
//!
//! SeatGrid sells a small, fixed inventory of seats to a flood of concurrent
//! buyers. This crate contains the coordination protocol that turns that flood
//! into at-most-one owner per seat:
//!
//! - [`coordinator::BookingCoordinator`] - the Gatekeeper → Commit → Compensate
//!   protocol for a single booking request.
//! - [`lock_store::LockStore`] - the atomic check-and-claim primitive the
//!   Gatekeeper rests on.
//! - [`strategy::CommitStrategy`] - the pluggable authoritative seat-state
//!   mutation (naive / pessimistic / optimistic).
//! - [`admission::AdmissionCache`] - the advisory sold-out fast path.
//! - [`reconciler::Reconciler`] - the sweep that releases claims stranded by
//!   crashed bookings.
//! - [`initializer::EventInitializer`] - event + seat materialization.
//!
//! The crate holds no I/O of its own: storage backends implement the seam
//! traits ([`seat_store::SeatStore`], [`lock_store::LockStore`],
//! [`admission::AdmissionCache`], [`strategy::CommitStrategy`]) and are wired
//! together at composition time by the server binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::future::Future;
use std::pin::Pin;

pub mod admission;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod initializer;
pub mod lock_store;
pub mod reconciler;
pub mod seat_store;
pub mod strategy;
pub mod types;

/// Boxed future returned by the seam traits.
///
/// The traits in this crate use explicit `Pin<Box<dyn Future>>` returns
/// instead of `async fn` so they stay dyn-compatible: the coordinator and the
/// server hold stores as `Arc<dyn LockStore>`, `Arc<dyn SeatStore>` and so on,
/// swapping backends (Postgres/Redis in production, in-memory in tests)
/// without generic plumbing.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use coordinator::{BookingCoordinator, BookingOutcome};
pub use error::BookingError;
pub use types::{Event, EventId, NewEvent, Seat, SeatId, SeatPos, SeatStatus};
