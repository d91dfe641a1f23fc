//! Commit strategy seam - the authoritative seat-state mutation.
//!
//! A strategy books a set of seats for a user inside one seat-store
//! transaction and reports a typed outcome. The Gatekeeper guarantees that at
//! most one coordinator reaches the strategy for any given seat, so the
//! strategy choice is a performance knob, not a correctness dependency; the
//! three variants exist so their contention profiles can be measured against
//! each other.

use crate::types::{EventId, SeatPos};
use crate::BoxFuture;
use std::fmt;
use thiserror::Error;

/// Typed commit outcome. Conflicts are surfaced, never retried here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitError {
    /// Fewer seats matched than were requested.
    #[error("requested seats not found")]
    SeatsNotFound,

    /// At least one matched seat is already `BOOKED`.
    #[error("requested seats no longer available")]
    SeatsUnavailable,

    /// Row locks could not be acquired without waiting (pessimistic only).
    #[error("row locks held by a concurrent transaction")]
    RowLockConflict,

    /// The conditional update matched fewer rows than requested because seat
    /// state changed after the fetch (optimistic only).
    #[error("seat versions changed during commit")]
    VersionConflict,

    /// Transaction or transport failure; the transaction was rolled back.
    #[error("seat store failure: {0}")]
    Store(String),
}

/// Books seats for a user, transactionally.
pub trait CommitStrategy: Send + Sync {
    /// Strategy name, for logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Mark every seat in `seats` as `BOOKED` by `user_id`, or nothing at all.
    ///
    /// # Errors
    ///
    /// A [`CommitError`] describing why nothing was written.
    fn commit<'a>(
        &'a self,
        event_id: EventId,
        user_id: &'a str,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<(), CommitError>>;
}

/// The configured commit discipline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    /// Read then write with no locking; the measurement baseline.
    Naive,
    /// Row-level `SELECT ... FOR UPDATE NOWAIT`.
    Pessimistic,
    /// Conditional update predicated on unchanged `(status, holder)`.
    Optimistic,
}

impl StrategyKind {
    /// Configuration spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::Pessimistic => "pessimistic",
            Self::Optimistic => "optimistic",
        }
    }

    /// Parse a configured name, falling back to [`StrategyKind::Optimistic`]
    /// (with a warning) when the name is unknown.
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "naive" => Self::Naive,
            "pessimistic" => Self::Pessimistic,
            "optimistic" => Self::Optimistic,
            other => {
                tracing::warn!(
                    strategy = other,
                    default = Self::Optimistic.as_str(),
                    "Unknown booking strategy, using default"
                );
                Self::Optimistic
            }
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_parse() {
        assert_eq!(StrategyKind::parse_or_default("naive"), StrategyKind::Naive);
        assert_eq!(
            StrategyKind::parse_or_default("Pessimistic"),
            StrategyKind::Pessimistic
        );
        assert_eq!(
            StrategyKind::parse_or_default(" optimistic "),
            StrategyKind::Optimistic
        );
    }

    #[test]
    fn unknown_name_falls_back_to_optimistic() {
        assert_eq!(
            StrategyKind::parse_or_default("serializable"),
            StrategyKind::Optimistic
        );
        assert_eq!(StrategyKind::parse_or_default(""), StrategyKind::Optimistic);
    }
}
