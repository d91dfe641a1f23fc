//! Controllable clock for staleness and TTL tests.

use chrono::{DateTime, Duration, Utc};
use seatgrid_core::clock::Clock;
use std::sync::Mutex;

/// Clock that only moves when a test advances it.
#[derive(Debug)]
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    /// Start the clock at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start the clock at the current wall time.
    #[must_use]
    pub fn from_wall_clock() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}
