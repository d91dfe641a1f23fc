//! `PostgreSQL` seat store and commit strategies for SeatGrid.
//!
//! This crate implements the authoritative side of the booking pipeline over
//! `PostgreSQL` using sqlx:
//!
//! - [`PostgresSeatStore`] - event/seat persistence behind the
//!   `seatgrid_core::seat_store::SeatStore` seam, with embedded migrations.
//! - [`strategy`] - the three commit disciplines (naive, pessimistic,
//!   optimistic) behind `seatgrid_core::strategy::CommitStrategy`, plus the
//!   registry that instantiates the configured one.
//!
//! All queries run at the pool's default `READ COMMITTED` isolation; the
//! strategies need nothing stronger because the Gatekeeper already serializes
//! contending bookings per seat.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod seat_store;
pub mod strategy;

pub use seat_store::PostgresSeatStore;
pub use strategy::{build_strategy, NaiveStrategy, OptimisticStrategy, PessimisticStrategy};
