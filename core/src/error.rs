//! Booking error taxonomy.
//!
//! Every component reports a typed outcome; the coordinator translates those
//! into this taxonomy and the HTTP layer maps the taxonomy onto status codes.
//! No component retries internally - conflicts are surfaced to the caller.

use crate::lock_store::LockStoreError;
use crate::strategy::CommitError;
use thiserror::Error;

/// Outcome of a rejected or failed booking.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BookingError {
    /// Malformed request: empty user, or no seats left after de-duplication.
    #[error("invalid booking request: {0}")]
    Invalid(String),

    /// Admission fast path: the remaining-seats counter reads zero.
    #[error("event is sold out")]
    SoldOut,

    /// Admission fast path: fewer seats remain than were requested.
    #[error("only {available} seats remain")]
    InsufficientCapacity {
        /// Counter value observed at rejection time.
        available: i64,
    },

    /// Gatekeeper rejection: at least one requested seat is already claimed.
    #[error("one or more requested seats are already claimed")]
    ConflictCached,

    /// Optimistic commit found seat state changed since fetch.
    #[error("seat state changed during commit")]
    ConflictVersion,

    /// Pessimistic commit could not take the row locks without waiting.
    #[error("seats are locked by a concurrent booking")]
    ConflictRowLock,

    /// Commit found fewer seats than requested; the grid has no such seats.
    #[error("one or more requested seats do not exist")]
    SeatsNotFound,

    /// Commit found at least one requested seat already booked.
    #[error("one or more requested seats are no longer available")]
    SeatsUnavailable,

    /// A dependency (lock store or seat store) failed or timed out.
    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    /// A bug: an unexpected failure inside the pipeline.
    #[error("internal booking failure: {0}")]
    Internal(String),
}

impl BookingError {
    /// Stable machine-readable code for the wire (`errorDetails`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "INVALID",
            Self::SoldOut => "SOLD_OUT",
            Self::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            Self::ConflictCached => "CONFLICT_CACHED",
            Self::ConflictVersion => "CONFLICT_VERSION",
            Self::ConflictRowLock => "CONFLICT_ROWLOCK",
            Self::SeatsNotFound => "SEATS_NOT_FOUND",
            Self::SeatsUnavailable => "SEATS_UNAVAILABLE",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// True for the rejection kinds a well-behaved client may retry: races
    /// over seats that another request may release or that simply lost.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SoldOut
                | Self::InsufficientCapacity { .. }
                | Self::ConflictCached
                | Self::ConflictVersion
                | Self::ConflictRowLock
                | Self::SeatsNotFound
                | Self::SeatsUnavailable
        )
    }
}

impl From<CommitError> for BookingError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::SeatsNotFound => Self::SeatsNotFound,
            CommitError::SeatsUnavailable => Self::SeatsUnavailable,
            CommitError::RowLockConflict => Self::ConflictRowLock,
            CommitError::VersionConflict => Self::ConflictVersion,
            CommitError::Store(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<LockStoreError> for BookingError {
    fn from(err: LockStoreError) -> Self {
        match err {
            LockStoreError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BookingError::SoldOut.code(), "SOLD_OUT");
        assert_eq!(
            BookingError::InsufficientCapacity { available: 3 }.code(),
            "INSUFFICIENT_CAPACITY"
        );
        assert_eq!(BookingError::ConflictCached.code(), "CONFLICT_CACHED");
        assert_eq!(BookingError::ConflictRowLock.code(), "CONFLICT_ROWLOCK");
    }

    #[test]
    fn conflicts_are_conflicts() {
        assert!(BookingError::ConflictCached.is_conflict());
        assert!(BookingError::SeatsUnavailable.is_conflict());
        assert!(!BookingError::Invalid("x".into()).is_conflict());
        assert!(!BookingError::Unavailable("down".into()).is_conflict());
        assert!(!BookingError::Internal("bug".into()).is_conflict());
    }

    #[test]
    fn commit_errors_map_onto_taxonomy() {
        assert_eq!(
            BookingError::from(CommitError::VersionConflict),
            BookingError::ConflictVersion
        );
        assert_eq!(
            BookingError::from(CommitError::RowLockConflict),
            BookingError::ConflictRowLock
        );
        assert_eq!(
            BookingError::from(CommitError::Store("pool timeout".into())),
            BookingError::Unavailable("pool timeout".into())
        );
    }
}
