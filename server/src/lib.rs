//! HTTP server for SeatGrid.
//!
//! Composes the booking pipeline from `seatgrid-core` with its Postgres and
//! Redis backends and exposes the wire surface:
//!
//! - `POST /events` - create an event and materialize its seat grid.
//! - `GET /events/:id/seats` - the seat map.
//! - `POST /bookings` - the booking pipeline.
//! - `GET /health/live`, `GET /health/ready` - probes.
//!
//! The binary in `main.rs` wires configuration, stores, the metric
//! decorators, the reconciler background task and graceful shutdown.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod instrument;
pub mod metrics;
pub mod server;
pub mod sweeper;

pub use config::Config;
pub use server::routes::build_router;
pub use server::state::AppState;
