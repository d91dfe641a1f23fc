//! Event management endpoints.
//!
//! - `POST /events` - create an event and materialize its seat grid.
//! - `GET /events/:id/seats` - the seat map, status only (holders are never
//!   exposed on the wire).

use crate::error::ApiError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use seatgrid_core::types::{EventId, NewEvent, SeatStatus};
use serde::{Deserialize, Serialize};

/// Request body for `POST /events`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// Display name.
    pub name: String,
    /// Scheduled date, ISO 8601.
    pub date: DateTime<Utc>,
    /// Number of seat rows, at least 1.
    pub rows: i32,
    /// Number of seat columns, at least 1.
    pub cols: i32,
}

/// Response body for a created event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Generated identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Scheduled date.
    pub date: DateTime<Utc>,
    /// Number of seat rows.
    pub rows: i32,
    /// Number of seat columns.
    pub cols: i32,
    /// Seats materialized for the grid.
    pub total_seats: i64,
}

/// One seat in the seat-map response.
#[derive(Debug, Serialize)]
pub struct SeatView {
    /// Row label.
    pub row: String,
    /// Column label.
    pub col: String,
    /// `AVAILABLE` or `BOOKED`.
    pub status: SeatStatus,
}

/// Create an event and materialize its `rows × cols` seat grid.
///
/// # Errors
///
/// 400 for a blank name or non-positive dimensions; 503 when the seat store
/// is unreachable.
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if req.rows < 1 || req.cols < 1 {
        return Err(ApiError::bad_request(format!(
            "rows and cols must be at least 1, got {}x{}",
            req.rows, req.cols
        )));
    }

    let event = state
        .initializer
        .create_event(NewEvent {
            name: req.name,
            date: req.date,
            rows: req.rows,
            cols: req.cols,
        })
        .await?;

    let total_seats = event.total_seats();
    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            id: event.id.as_i64(),
            name: event.name,
            date: event.date,
            rows: event.rows,
            cols: event.cols,
            total_seats,
        }),
    ))
}

/// The full seat map of an event.
///
/// # Errors
///
/// 404 for an unknown event; 503 when the seat store is unreachable.
pub async fn get_seat_map(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<SeatView>>, ApiError> {
    let event_id = EventId::new(event_id);

    if state.seat_store.get_event(event_id).await?.is_none() {
        return Err(ApiError::not_found("Event", event_id));
    }

    let seats = state.seat_store.seat_map(event_id).await?;
    Ok(Json(
        seats
            .into_iter()
            .map(|seat| SeatView {
                row: seat.pos.row,
                col: seat.pos.col,
                status: seat.status,
            })
            .collect(),
    ))
}
