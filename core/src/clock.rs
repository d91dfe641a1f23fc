//! Time abstraction.
//!
//! Claim timestamps and staleness decisions flow through [`Clock`] so the
//! reconciler and the lock-store protocol can be tested with a controlled
//! clock instead of wall time.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
