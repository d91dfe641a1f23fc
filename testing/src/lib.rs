//! Test doubles for the SeatGrid booking pipeline.
//!
//! Every seam trait of `seatgrid-core` has an in-memory implementation here:
//! a seat store, a commit strategy over it, a lock store whose `try_claim` is
//! made atomic by a mutex, and an admission counter. All of them carry call
//! counters so tests can assert *which* stores a request touched - the
//! sold-out fast path, for example, is observable as "zero lock-store and
//! zero seat-store calls".
//!
//! Failure injection mirrors the outages the pipeline has to absorb:
//! `set_fail_claims` for a down lock store, `fail_next_with` /
//! `panic_on_next_commit` for commit failures and bugs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod clock;
pub mod lock_store;
pub mod seat_store;

pub use admission::InMemoryAdmissionCache;
pub use clock::TestClock;
pub use lock_store::InMemoryLockStore;
pub use seat_store::{InMemoryCommitStrategy, InMemorySeatStore};
