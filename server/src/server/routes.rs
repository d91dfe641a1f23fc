//! Router configuration.

use super::health::{liveness, readiness};
use super::state::AppState;
use crate::api::{bookings, events};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Event management and seat maps
        .route("/events", post(events::create_event))
        .route("/events/:id/seats", get(events::get_seat_map))
        // The booking pipeline
        .route("/bookings", post(bookings::book_seats))
        // Probes
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .with_state(state)
}
