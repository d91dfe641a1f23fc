//! HTTP error type bridging domain errors and responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seatgrid_core::seat_store::SeatStoreError;
use serde::Serialize;
use std::fmt;

/// Application error for web handlers.
///
/// Wraps a status code, a user-facing message and a machine-readable code;
/// implements [`IntoResponse`] so handlers can use `?`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
    /// Internal cause, logged but never sent to the client.
    #[allow(dead_code)]
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach an internal cause for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SeatStoreError> for ApiError {
    fn from(err: SeatStoreError) -> Self {
        match err {
            SeatStoreError::InvalidEvent(msg) => Self::bad_request(msg),
            SeatStoreError::Unavailable(msg) => {
                Self::unavailable("seat store unavailable").with_source(anyhow::anyhow!(msg))
            }
        }
    }
}
