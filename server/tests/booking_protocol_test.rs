//! Booking protocol tests over the in-memory stores.
//!
//! These exercise the Gatekeeper → Commit → Compensate pipeline end to end
//! without external services: races resolve to exactly one winner, fast-path
//! rejections touch neither store, and every failed commit compensates its
//! claim. Call counters on the mocks make the "never touched" assertions
//! observable.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::Utc;
use seatgrid_core::admission::AdmissionCache;
use seatgrid_core::clock::Clock;
use seatgrid_core::coordinator::BookingCoordinator;
use seatgrid_core::error::BookingError;
use seatgrid_core::initializer::EventInitializer;
use seatgrid_core::lock_store::LockStore;
use seatgrid_core::strategy::{CommitError, CommitStrategy};
use seatgrid_core::types::{EventId, NewEvent, SeatPos, SeatStatus};
use seatgrid_testing::{
    InMemoryAdmissionCache, InMemoryCommitStrategy, InMemoryLockStore, InMemorySeatStore, TestClock,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Pipeline {
    seat_store: Arc<InMemorySeatStore>,
    lock_store: Arc<InMemoryLockStore>,
    admission: Arc<InMemoryAdmissionCache>,
    strategy: Arc<InMemoryCommitStrategy>,
    clock: Arc<TestClock>,
    coordinator: Arc<BookingCoordinator>,
}

fn pipeline() -> Pipeline {
    let seat_store = Arc::new(InMemorySeatStore::new());
    let lock_store = Arc::new(InMemoryLockStore::new());
    let admission = Arc::new(InMemoryAdmissionCache::new());
    let strategy = Arc::new(InMemoryCommitStrategy::new(Arc::clone(&seat_store)));
    let clock = Arc::new(TestClock::from_wall_clock());
    let coordinator = Arc::new(BookingCoordinator::new(
        Arc::clone(&lock_store) as Arc<dyn LockStore>,
        Arc::clone(&admission) as Arc<dyn AdmissionCache>,
        Arc::clone(&strategy) as Arc<dyn CommitStrategy>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    Pipeline {
        seat_store,
        lock_store,
        admission,
        strategy,
        clock,
        coordinator,
    }
}

async fn seed_event(p: &Pipeline, rows: i32, cols: i32) -> EventId {
    let initializer = EventInitializer::new(
        Arc::clone(&p.seat_store) as _,
        Arc::clone(&p.admission) as _,
    );
    initializer
        .create_event(NewEvent {
            name: format!("flash sale {rows}x{cols}"),
            date: Utc::now(),
            rows,
            cols,
        })
        .await
        .unwrap()
        .id
}

fn pos(row: &str, col: &str) -> SeatPos {
    SeatPos::new(row, col)
}

// ============================================================================
// Races
// ============================================================================

/// Two buyers race for the single seat of a 1x1 event: exactly one wins, the
/// seat belongs to the winner, and the admission counter reaches zero.
#[tokio::test]
async fn test_single_seat_two_racers() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;
    let seat = pos("1", "1");

    let (r1, r2) = tokio::join!(
        p.coordinator.book_seats(event, "u1", vec![seat.clone()]),
        p.coordinator.book_seats(event, "u2", vec![seat.clone()]),
    );

    assert!(
        r1.is_ok() ^ r2.is_ok(),
        "exactly one racer may win, got {r1:?} / {r2:?}"
    );
    let loser = if r1.is_ok() { &r2 } else { &r1 };
    assert!(loser.as_ref().unwrap_err().is_conflict());

    let winner = if r1.is_ok() { "u1" } else { "u2" };
    let (status, holder) = p.seat_store.seat_state(event, &seat).unwrap();
    assert_eq!(status, SeatStatus::Booked);
    assert_eq!(holder.as_deref(), Some(winner));

    assert_eq!(p.admission.value(event), Some(0));
}

/// Overlapping multi-seat requests: the winner books *all* of its seats, the
/// loser books none, and the uncontested seat stays available.
#[tokio::test]
async fn test_partial_overlap_no_partial_commit() {
    let p = pipeline();
    let event = seed_event(&p, 1, 3).await;

    let a = vec![pos("1", "1"), pos("1", "2")];
    let b = vec![pos("1", "2"), pos("1", "3")];
    let (ra, rb) = tokio::join!(
        p.coordinator.book_seats(event, "alice", a),
        p.coordinator.book_seats(event, "bob", b),
    );

    assert!(ra.is_ok() ^ rb.is_ok(), "got {ra:?} / {rb:?}");
    let loser = if ra.is_ok() { &rb } else { &ra };
    assert!(loser.as_ref().unwrap_err().is_conflict());

    let booked = p.seat_store.booked_positions(event);
    if let Ok(outcome) = ra {
        assert_eq!(outcome.seat_count, 2);
        assert_eq!(booked, vec![pos("1", "1"), pos("1", "2")]);
        assert_eq!(
            p.seat_store.seat_state(event, &pos("1", "3")).unwrap().0,
            SeatStatus::Available
        );
    } else {
        assert_eq!(rb.unwrap().seat_count, 2);
        assert_eq!(booked, vec![pos("1", "2"), pos("1", "3")]);
        assert_eq!(
            p.seat_store.seat_state(event, &pos("1", "1")).unwrap().0,
            SeatStatus::Available
        );
    }
}

/// Gatekeeper mutual exclusion under fan-out: of N concurrent claims on one
/// seat, exactly one is granted.
#[tokio::test]
async fn test_gatekeeper_admits_exactly_one_of_many() {
    let p = pipeline();
    let event = EventId::new(77);
    let now = p.clock.now();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let lock_store = Arc::clone(&p.lock_store);
        handles.push(tokio::spawn(async move {
            let seat = [pos("5", "5")];
            lock_store.try_claim(event, &seat, now).await.unwrap()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }
    assert_eq!(granted, 1);
}

// ============================================================================
// Admission fast path
// ============================================================================

/// A sold-out event rejects a burst of bookings without touching the lock
/// store or the seat store.
#[tokio::test]
async fn test_sold_out_fast_path_touches_nothing() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;
    p.coordinator
        .book_seats(event, "winner", vec![pos("1", "1")])
        .await
        .unwrap();
    assert_eq!(p.admission.value(event), Some(0));

    let claims_before = p.lock_store.claim_calls.load(Ordering::SeqCst);
    let reads_before = p.seat_store.read_calls.load(Ordering::SeqCst);
    let commits_before = p.strategy.commit_calls.load(Ordering::SeqCst);

    for i in 0..100 {
        let err = p
            .coordinator
            .book_seats(event, &format!("u{i}"), vec![pos("1", "1")])
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::SoldOut);
    }

    assert_eq!(p.lock_store.claim_calls.load(Ordering::SeqCst), claims_before);
    assert_eq!(p.seat_store.read_calls.load(Ordering::SeqCst), reads_before);
    assert_eq!(p.strategy.commit_calls.load(Ordering::SeqCst), commits_before);
}

/// Requesting more seats than the counter says remain is rejected before the
/// Gatekeeper.
#[tokio::test]
async fn test_insufficient_capacity_fast_path() {
    let p = pipeline();
    let event = seed_event(&p, 1, 2).await;
    p.admission.seed(event, 1).await.unwrap();

    let claims_before = p.lock_store.claim_calls.load(Ordering::SeqCst);
    let err = p
        .coordinator
        .book_seats(event, "greedy", vec![pos("1", "1"), pos("1", "2")])
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::InsufficientCapacity { available: 1 });
    assert_eq!(p.lock_store.claim_calls.load(Ordering::SeqCst), claims_before);

    // One seat still fits.
    let outcome = p
        .coordinator
        .book_seats(event, "modest", vec![pos("1", "1")])
        .await
        .unwrap();
    assert_eq!(outcome.seat_count, 1);
}

/// A cache fault never rejects: the fast path is skipped and the booking
/// proceeds normally.
#[tokio::test]
async fn test_cache_fault_skips_fast_path() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;
    p.admission.set_fail_peeks(true);

    let outcome = p
        .coordinator
        .book_seats(event, "undeterred", vec![pos("1", "1")])
        .await
        .unwrap();
    assert_eq!(outcome.seat_count, 1);
}

/// Booking everything drives the counter to zero; from then on rejections are
/// answered from the counter alone.
#[tokio::test]
async fn test_admission_counter_oracle() {
    let p = pipeline();
    let event = seed_event(&p, 2, 2).await;
    assert_eq!(p.admission.value(event), Some(4));

    let all = vec![pos("1", "1"), pos("1", "2"), pos("2", "1"), pos("2", "2")];
    p.coordinator
        .book_seats(event, "whale", all)
        .await
        .unwrap();
    assert_eq!(p.admission.value(event), Some(0));
    assert_eq!(p.seat_store.booked_count(event), 4);

    let claims_before = p.lock_store.claim_calls.load(Ordering::SeqCst);
    let reads_before = p.seat_store.read_calls.load(Ordering::SeqCst);
    let err = p
        .coordinator
        .book_seats(event, "late", vec![pos("1", "1")])
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::SoldOut);
    assert_eq!(p.lock_store.claim_calls.load(Ordering::SeqCst), claims_before);
    assert_eq!(p.seat_store.read_calls.load(Ordering::SeqCst), reads_before);
}

// ============================================================================
// Compensation
// ============================================================================

/// A failed commit releases its claim and leaves seat state and counter
/// untouched; the seats are immediately bookable again.
#[tokio::test]
async fn test_commit_failure_compensates_claim() {
    let p = pipeline();
    let event = seed_event(&p, 1, 2).await;
    let seats = vec![pos("1", "1"), pos("1", "2")];

    p.strategy
        .fail_next_with(CommitError::Store("connection reset".into()));
    let err = p
        .coordinator
        .book_seats(event, "unlucky", seats.clone())
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::Unavailable("connection reset".into()));

    assert_eq!(p.lock_store.claim_count(event), 0, "claim must be released");
    assert_eq!(p.lock_store.release_calls.load(Ordering::SeqCst), 1);
    assert_eq!(p.seat_store.booked_count(event), 0);
    assert_eq!(p.admission.value(event), Some(2), "counter untouched on failure");

    let outcome = p
        .coordinator
        .book_seats(event, "second-chance", seats)
        .await
        .unwrap();
    assert_eq!(outcome.seat_count, 2);
}

/// Typed commit conflicts compensate too and surface their own kind.
#[tokio::test]
async fn test_version_conflict_compensates_and_surfaces() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;

    p.strategy.fail_next_with(CommitError::VersionConflict);
    let err = p
        .coordinator
        .book_seats(event, "racer", vec![pos("1", "1")])
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::ConflictVersion);
    assert_eq!(p.lock_store.claim_count(event), 0);
}

/// A panicking commit strategy still compensates exactly once and surfaces as
/// an internal error, not a hang or a stranded claim.
#[tokio::test]
async fn test_commit_panic_compensates_claim() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;

    p.strategy.panic_on_next_commit();
    let err = p
        .coordinator
        .book_seats(event, "bitten-by-bug", vec![pos("1", "1")])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Internal(_)), "got {err:?}");
    assert_eq!(p.lock_store.claim_count(event), 0);
    assert_eq!(p.lock_store.release_calls.load(Ordering::SeqCst), 1);

    // The seat survives the bug.
    let outcome = p
        .coordinator
        .book_seats(event, "recovered", vec![pos("1", "1")])
        .await
        .unwrap();
    assert_eq!(outcome.seat_count, 1);
}

/// When compensation itself fails the original commit error is preserved and
/// the claim is left for the reconciler.
#[tokio::test]
async fn test_release_failure_keeps_commit_error() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;

    p.strategy
        .fail_next_with(CommitError::Store("commit exploded".into()));
    p.lock_store.set_fail_releases(true);

    let err = p
        .coordinator
        .book_seats(event, "doomed", vec![pos("1", "1")])
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::Unavailable("commit exploded".into()));
    // The claim is now a ghost; the reconciler owns it from here.
    assert_eq!(p.lock_store.claim_count(event), 1);
}

// ============================================================================
// Gatekeeper failure
// ============================================================================

/// A lock store outage rejects as unavailable without ever reaching the seat
/// store.
#[tokio::test]
async fn test_lock_store_outage_never_reaches_commit() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;
    p.lock_store.set_fail_claims(true);

    let err = p
        .coordinator
        .book_seats(event, "blocked", vec![pos("1", "1")])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Unavailable(_)));
    assert_eq!(p.strategy.commit_calls.load(Ordering::SeqCst), 0);
    assert_eq!(p.seat_store.booked_count(event), 0);
}

/// A committed booking keeps its lock entries: subsequent claims on any of
/// those seats are rejected from the cache without touching the seat store.
#[tokio::test]
async fn test_booked_seats_stay_claimed() {
    let p = pipeline();
    let event = seed_event(&p, 1, 2).await;
    p.coordinator
        .book_seats(event, "keeper", vec![pos("1", "1"), pos("1", "2")])
        .await
        .unwrap();
    assert_eq!(p.lock_store.claim_count(event), 2);

    let commits_before = p.strategy.commit_calls.load(Ordering::SeqCst);
    let err = p
        .coordinator
        .book_seats(event, "late", vec![pos("1", "2")])
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::ConflictCached);
    assert_eq!(p.strategy.commit_calls.load(Ordering::SeqCst), commits_before);
}

// ============================================================================
// Validation and idempotence
// ============================================================================

/// Empty input, blank users and blank labels are invalid before any store is
/// consulted.
#[tokio::test]
async fn test_validation_rejects_before_stores() {
    let p = pipeline();
    let event = seed_event(&p, 1, 1).await;
    let claims_before = p.lock_store.claim_calls.load(Ordering::SeqCst);

    let err = p
        .coordinator
        .book_seats(event, "user", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Invalid(_)));

    let err = p
        .coordinator
        .book_seats(event, "   ", vec![pos("1", "1")])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Invalid(_)));

    let err = p
        .coordinator
        .book_seats(event, "user", vec![pos("", "1")])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Invalid(_)));

    assert_eq!(p.lock_store.claim_calls.load(Ordering::SeqCst), claims_before);
}

/// Duplicate seats collapse to one; the outcome and the counter reflect the
/// de-duplicated set.
#[tokio::test]
async fn test_duplicate_seats_collapse() {
    let p = pipeline();
    let event = seed_event(&p, 1, 2).await;

    let outcome = p
        .coordinator
        .book_seats(
            event,
            "double-clicker",
            vec![pos("1", "1"), pos("1", "1"), pos("1", "1")],
        )
        .await
        .unwrap();
    assert_eq!(outcome.seat_count, 1);
    assert_eq!(p.seat_store.booked_count(event), 1);
    assert_eq!(p.admission.value(event), Some(1));
}

/// Releasing the same seats twice equals releasing them once.
#[tokio::test]
async fn test_release_is_idempotent() {
    let p = pipeline();
    let event = EventId::new(42);
    let seats = [pos("1", "1"), pos("1", "2")];

    assert!(p
        .lock_store
        .try_claim(event, &seats, p.clock.now())
        .await
        .unwrap());
    assert_eq!(p.lock_store.release(event, &seats).await.unwrap(), 2);
    assert_eq!(p.lock_store.release(event, &seats).await.unwrap(), 0);
    assert_eq!(p.lock_store.claim_count(event), 0);
}

/// Claim-then-release returns the lock store to its prior state, so a fresh
/// claim succeeds.
#[tokio::test]
async fn test_claim_release_round_trip() {
    let p = pipeline();
    let event = EventId::new(43);
    let seats = [pos("2", "2")];
    let now = p.clock.now();

    assert!(p.lock_store.try_claim(event, &seats, now).await.unwrap());
    p.lock_store.release(event, &seats).await.unwrap();
    assert!(p.lock_store.try_claim(event, &seats, now).await.unwrap());
}

// ============================================================================
// Aggregate safety
// ============================================================================

/// Hammer a small grid with many concurrent multi-seat bookings: successful
/// bookings partition into disjoint seat sets and never oversell the grid.
#[tokio::test]
async fn test_no_double_booking_under_contention() {
    let p = pipeline();
    let event = seed_event(&p, 2, 2).await;
    let all_seats = [pos("1", "1"), pos("1", "2"), pos("2", "1"), pos("2", "2")];

    let mut handles = Vec::new();
    for i in 0..40 {
        let coordinator = Arc::clone(&p.coordinator);
        // Each buyer wants two seats, overlapping with neighbours.
        let wanted = vec![
            all_seats[i % 4].clone(),
            all_seats[(i + 1) % 4].clone(),
        ];
        handles.push(tokio::spawn(async move {
            coordinator.book_seats(event, &format!("u{i}"), wanted).await
        }));
    }

    let mut seats_won = 0;
    for handle in handles {
        if let Ok(outcome) = handle.await.unwrap() {
            seats_won += outcome.seat_count;
        }
    }

    let booked = p.seat_store.booked_count(event);
    assert_eq!(seats_won, booked, "every committed seat was won exactly once");
    assert!(booked <= 4, "a 2x2 grid can never sell more than 4 seats");

    // Every booked seat has exactly one holder.
    for seat in &all_seats {
        let (status, holder) = p.seat_store.seat_state(event, seat).unwrap();
        assert_eq!(holder.is_some(), status == SeatStatus::Booked);
    }
}
