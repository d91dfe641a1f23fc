//! Booking coordinator - the Gatekeeper → Commit → Compensate protocol.
//!
//! The coordinator is stateless; one instance serves every request. For any
//! two concurrent bookings whose seat sets intersect, at most one observes
//! `try_claim = true` and therefore at most one reaches the commit strategy
//! for any contested seat. Combined with booked-is-terminal in the seat store
//! this rules out double-booking under unbounded concurrency, whichever commit
//! strategy is configured.
//!
//! # Cancellation
//!
//! The stretch between a successful claim and its commit-or-compensation must
//! not be abandoned when the caller goes away, or the claim would be stranded
//! until the reconciler finds it. The coordinator therefore runs that stretch
//! on a spawned task: a client disconnect cancels the *await*, not the work.
//! A panic inside the commit is contained the same way, so compensation is
//! attempted exactly once per successful claim.

use crate::admission::AdmissionCache;
use crate::clock::Clock;
use crate::error::BookingError;
use crate::lock_store::LockStore;
use crate::strategy::CommitStrategy;
use crate::types::{EventId, SeatPos};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Successful booking result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingOutcome {
    /// Number of seats committed (after de-duplication).
    pub seat_count: usize,
}

/// Stateless handler for `book_seats` requests.
pub struct BookingCoordinator {
    lock_store: Arc<dyn LockStore>,
    admission: Arc<dyn AdmissionCache>,
    strategy: Arc<dyn CommitStrategy>,
    clock: Arc<dyn Clock>,
}

impl BookingCoordinator {
    /// Wire a coordinator from its collaborators.
    #[must_use]
    pub fn new(
        lock_store: Arc<dyn LockStore>,
        admission: Arc<dyn AdmissionCache>,
        strategy: Arc<dyn CommitStrategy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lock_store,
            admission,
            strategy,
            clock,
        }
    }

    /// Name of the configured commit strategy.
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Book `seats` of `event_id` for `user_id`.
    ///
    /// # Errors
    ///
    /// A [`BookingError`] naming why the booking was rejected; see the module
    /// docs for the protocol. No retries happen here - a conflict is returned
    /// to the caller as-is.
    pub async fn book_seats(
        &self,
        event_id: EventId,
        user_id: &str,
        seats: Vec<SeatPos>,
    ) -> Result<BookingOutcome, BookingError> {
        // Step 1: validate and normalize.
        if user_id.trim().is_empty() {
            return Err(BookingError::Invalid("user id must not be empty".into()));
        }
        let seats = normalize_seats(seats)?;
        let requested = seats.len();

        // Step 2: admission fast path. The counter is advisory: absence or a
        // cache error skips the check, it never rejects.
        match self.admission.peek(event_id).await {
            Some(remaining) if remaining <= 0 => {
                debug!(event_id = %event_id, "Admission fast path: sold out");
                return Err(BookingError::SoldOut);
            }
            Some(remaining) if (remaining as usize) < requested => {
                debug!(
                    event_id = %event_id,
                    remaining,
                    requested,
                    "Admission fast path: insufficient capacity"
                );
                return Err(BookingError::InsufficientCapacity {
                    available: remaining,
                });
            }
            _ => {}
        }

        // Steps 3-4 run detached from the caller so cancellation cannot
        // strand a claim between Gatekeeper and commit.
        let lock_store = Arc::clone(&self.lock_store);
        let admission = Arc::clone(&self.admission);
        let strategy = Arc::clone(&self.strategy);
        let now = self.clock.now();
        let user = user_id.to_string();

        let handle = tokio::spawn(async move {
            claim_and_commit(lock_store, admission, strategy, event_id, user, seats, now).await
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(BookingError::Internal(format!(
                "booking task aborted: {join_err}"
            ))),
        }
    }
}

/// Steps 3-4 of the protocol: Gatekeeper claim, authoritative commit, and
/// compensation on failure.
async fn claim_and_commit(
    lock_store: Arc<dyn LockStore>,
    admission: Arc<dyn AdmissionCache>,
    strategy: Arc<dyn CommitStrategy>,
    event_id: EventId,
    user: String,
    seats: Vec<SeatPos>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<BookingOutcome, BookingError> {
    // Step 3: Gatekeeper. An error here is "claim failed" - the seat store is
    // never touched after an ambiguous claim.
    let claimed = lock_store.try_claim(event_id, &seats, now).await?;
    if !claimed {
        return Err(BookingError::ConflictCached);
    }

    // Step 4: authoritative commit. Panics are contained so the claim is
    // compensated exactly once before the failure surfaces.
    let commit = AssertUnwindSafe(strategy.commit(event_id, &user, &seats))
        .catch_unwind()
        .await;

    match commit {
        Ok(Ok(())) => {
            // Success: decrement the admission counter best-effort and keep
            // the lock entries - they now mirror booked seats and the
            // reconciler will leave them alone.
            let count = seats.len();
            if let Err(err) = admission.decrement(event_id, count as i64).await {
                warn!(
                    event_id = %event_id,
                    error = %err,
                    "Admission decrement failed after commit"
                );
            }
            Ok(BookingOutcome { seat_count: count })
        }
        Ok(Err(commit_err)) => {
            release_claim(lock_store.as_ref(), event_id, &seats).await;
            Err(commit_err.into())
        }
        Err(panic) => {
            release_claim(lock_store.as_ref(), event_id, &seats).await;
            Err(BookingError::Internal(format!(
                "commit strategy panicked: {}",
                panic_message(&panic)
            )))
        }
    }
}

/// Best-effort compensation: failures are logged, never propagated - the
/// reconciler eventually removes anything left behind.
async fn release_claim(lock_store: &dyn LockStore, event_id: EventId, seats: &[SeatPos]) {
    if let Err(err) = lock_store.release(event_id, seats).await {
        warn!(
            event_id = %event_id,
            seats = seats.len(),
            error = %err,
            "Claim release failed, leaving cleanup to the reconciler"
        );
    }
}

/// De-duplicate on `(row, col)` preserving request order, rejecting empty
/// inputs and blank labels.
fn normalize_seats(seats: Vec<SeatPos>) -> Result<Vec<SeatPos>, BookingError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(seats.len());
    for seat in seats {
        if seat.row.trim().is_empty() || seat.col.trim().is_empty() {
            return Err(BookingError::Invalid(
                "seat row and col labels must not be empty".into(),
            ));
        }
        if seen.insert((seat.row.clone(), seat.col.clone())) {
            normalized.push(seat);
        }
    }
    if normalized.is_empty() {
        return Err(BookingError::Invalid(
            "at least one seat must be requested".into(),
        ));
    }
    Ok(normalized)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: &str, col: &str) -> SeatPos {
        SeatPos::new(row, col)
    }

    #[test]
    fn normalize_deduplicates_preserving_order() {
        let seats = vec![pos("1", "2"), pos("1", "1"), pos("1", "2"), pos("1", "1")];
        let normalized = normalize_seats(seats).unwrap();
        assert_eq!(normalized, vec![pos("1", "2"), pos("1", "1")]);
    }

    #[test]
    fn normalize_rejects_empty_input() {
        assert_eq!(
            normalize_seats(vec![]),
            Err(BookingError::Invalid(
                "at least one seat must be requested".into()
            ))
        );
    }

    #[test]
    fn normalize_rejects_blank_labels() {
        let err = normalize_seats(vec![pos("", "1")]).unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));
        let err = normalize_seats(vec![pos("1", "  ")]).unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));
    }
}
