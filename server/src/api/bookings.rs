//! Booking endpoint.
//!
//! `POST /bookings` runs the full admission pipeline. Status mapping:
//! 200 on commit, 400 for invalid input, 409 for every race a client may
//! retry, 503 when a dependency is down, 500 only for bugs.

use crate::metrics::record_booking;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use seatgrid_core::error::BookingError;
use seatgrid_core::types::{EventId, SeatPos};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSeatsRequest {
    /// Target event.
    pub event_id: i64,
    /// Buyer identifier, opaque and non-empty.
    pub user_id: String,
    /// Requested seats; duplicates are collapsed.
    pub seats: Vec<SeatRef>,
}

/// One seat in a booking request.
#[derive(Debug, Deserialize)]
pub struct SeatRef {
    /// Row label.
    pub row: String,
    /// Column label.
    pub col: String,
}

/// Response body for `POST /bookings`, success and failure alike.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Whether the booking committed.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Seats committed, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_count: Option<usize>,
    /// Machine-readable rejection code, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

/// Book seats for a user.
pub async fn book_seats(
    State(state): State<AppState>,
    Json(req): Json<BookSeatsRequest>,
) -> (StatusCode, Json<BookingResponse>) {
    let started = Instant::now();
    let event_id = EventId::new(req.event_id);
    let seats: Vec<SeatPos> = req
        .seats
        .into_iter()
        .map(|s| SeatPos::new(s.row, s.col))
        .collect();

    match state
        .coordinator
        .book_seats(event_id, &req.user_id, seats)
        .await
    {
        Ok(outcome) => {
            record_booking("success", outcome.seat_count, started.elapsed().as_secs_f64());
            info!(
                event_id = %event_id,
                user_id = %req.user_id,
                seat_count = outcome.seat_count,
                "Booking committed"
            );
            (
                StatusCode::OK,
                Json(BookingResponse {
                    success: true,
                    message: format!("booked {} seat(s)", outcome.seat_count),
                    seat_count: Some(outcome.seat_count),
                    error_details: None,
                }),
            )
        }
        Err(err) => {
            record_booking(err.code(), 0, started.elapsed().as_secs_f64());
            if matches!(err, BookingError::Internal(_)) {
                error!(event_id = %event_id, error = %err, "Booking failed unexpectedly");
            }
            (
                status_for(&err),
                Json(BookingResponse {
                    success: false,
                    message: err.to_string(),
                    seat_count: None,
                    error_details: Some(err.code().to_string()),
                }),
            )
        }
    }
}

/// Stable status mapping for the booking taxonomy.
fn status_for(err: &BookingError) -> StatusCode {
    match err {
        BookingError::Invalid(_) => StatusCode::BAD_REQUEST,
        BookingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ if err.is_conflict() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_kinds_map_to_409() {
        for err in [
            BookingError::SoldOut,
            BookingError::InsufficientCapacity { available: 2 },
            BookingError::ConflictCached,
            BookingError::ConflictVersion,
            BookingError::ConflictRowLock,
            BookingError::SeatsNotFound,
            BookingError::SeatsUnavailable,
        ] {
            assert_eq!(status_for(&err), StatusCode::CONFLICT, "{err:?}");
        }
    }

    #[test]
    fn boundary_kinds_keep_their_status() {
        assert_eq!(
            status_for(&BookingError::Invalid("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&BookingError::Unavailable("redis down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&BookingError::Internal("bug".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
