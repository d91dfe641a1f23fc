//! Domain types for the SeatGrid booking pipeline.
//!
//! Identifiers are 64-bit integers generated by the seat store. Seat
//! coordinates are opaque strings end to end so venues can label rows and
//! columns however they like (`"A"`, `"12"`, `"Balcony"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(i64);

impl EventId {
    /// Wrap a raw database identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(i64);

impl SeatId {
    /// Wrap a raw database identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Seat coordinates
// ============================================================================

/// Position of a seat within an event, as labeled coordinates.
///
/// A position doubles as the lock-store field key via [`SeatPos::field_key`],
/// which renders `row "A", col "12"` as `"A-12"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatPos {
    /// Row label.
    pub row: String,
    /// Column label.
    pub col: String,
}

impl SeatPos {
    /// Create a position from row and column labels.
    pub fn new(row: impl Into<String>, col: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            col: col.into(),
        }
    }

    /// Lock-store field key for this position (`"{row}-{col}"`).
    #[must_use]
    pub fn field_key(&self) -> String {
        format!("{}-{}", self.row, self.col)
    }

    /// Parse a lock-store field key back into a position.
    ///
    /// Splits on the first `-`, mirroring [`SeatPos::field_key`]. Returns
    /// `None` for keys without a separator.
    #[must_use]
    pub fn from_field_key(key: &str) -> Option<Self> {
        let (row, col) = key.split_once('-')?;
        Some(Self::new(row, col))
    }
}

impl fmt::Display for SeatPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Lifecycle status of a seat.
///
/// Booking is terminal: once a seat is `Booked` the pair (status, holder) is
/// never mutated again by this pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// The seat can still be sold.
    Available,
    /// The seat has been sold to `holder`.
    Booked,
}

impl SeatStatus {
    /// Canonical wire/storage spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Booked => "BOOKED",
        }
    }

    /// Parse the storage spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(Self::Available),
            "BOOKED" => Some(Self::Booked),
            _ => None,
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seat as held by the seat store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Generated identifier.
    pub id: SeatId,
    /// Owning event.
    pub event_id: EventId,
    /// Position within the event.
    pub pos: SeatPos,
    /// Current status.
    pub status: SeatStatus,
    /// User holding the seat; set exactly when `status` is `Booked`.
    pub holder: Option<String>,
}

// ============================================================================
// Events
// ============================================================================

/// An event with a fixed seat grid. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Generated identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Scheduled date.
    pub date: DateTime<Utc>,
    /// Number of seat rows.
    pub rows: i32,
    /// Number of seat columns.
    pub cols: i32,
}

impl Event {
    /// Total seat count of the grid.
    #[must_use]
    pub const fn total_seats(&self) -> i64 {
        self.rows as i64 * self.cols as i64
    }
}

/// Parameters for creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Scheduled date.
    pub date: DateTime<Utc>,
    /// Number of seat rows, at least 1.
    pub rows: i32,
    /// Number of seat columns, at least 1.
    pub cols: i32,
}

impl NewEvent {
    /// Total seat count the grid will materialize to.
    #[must_use]
    pub const fn total_seats(&self) -> i64 {
        self.rows as i64 * self.cols as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_key_round_trips() {
        let pos = SeatPos::new("A", "12");
        assert_eq!(pos.field_key(), "A-12");
        assert_eq!(SeatPos::from_field_key("A-12"), Some(pos));
    }

    #[test]
    fn field_key_splits_on_first_dash() {
        // Column labels may themselves contain dashes.
        let parsed = SeatPos::from_field_key("B-3-left").unwrap();
        assert_eq!(parsed.row, "B");
        assert_eq!(parsed.col, "3-left");
    }

    #[test]
    fn field_key_without_separator_is_rejected() {
        assert_eq!(SeatPos::from_field_key("garbage"), None);
    }

    #[test]
    fn status_spelling_round_trips() {
        assert_eq!(SeatStatus::parse("AVAILABLE"), Some(SeatStatus::Available));
        assert_eq!(SeatStatus::parse("BOOKED"), Some(SeatStatus::Booked));
        assert_eq!(SeatStatus::parse("RESERVED"), None);
        assert_eq!(SeatStatus::Booked.as_str(), "BOOKED");
    }

    #[test]
    fn status_serializes_screaming() {
        let json = serde_json::to_string(&SeatStatus::Available).unwrap();
        assert_eq!(json, "\"AVAILABLE\"");
    }

    #[test]
    fn total_seats_multiplies_dimensions() {
        let ev = NewEvent {
            name: "Launch night".to_string(),
            date: Utc::now(),
            rows: 20,
            cols: 30,
        };
        assert_eq!(ev.total_seats(), 600);
    }
}
