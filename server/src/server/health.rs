//! Health check endpoints.

use super::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Liveness response.
#[derive(Serialize)]
pub struct LivenessResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Liveness probe: 200 whenever the process is serving requests.
pub async fn liveness() -> (StatusCode, Json<LivenessResponse>) {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness.
    pub ready: bool,
    /// Seat store reachability.
    pub seat_store: bool,
    /// Lock store reachability.
    pub lock_store: bool,
}

/// Readiness probe: 200 iff both the seat store and the lock store answer a
/// real round-trip. Used to gate traffic during startup and outages.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let (seat_store, lock_store) =
        tokio::join!(state.seat_store.ping(), state.lock_store.ping());
    let seat_store = seat_store.is_ok();
    let lock_store = lock_store.is_ok();
    let ready = seat_store && lock_store;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            ready,
            seat_store,
            lock_store,
        }),
    )
}
