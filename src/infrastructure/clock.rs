//! System clock adapter.
//!
//! The in-memory dedup store reads time through the `Clock` port so record
//! expiry can be driven by `MockClock` in tests (see
//! `crate::infrastructure::mocks`, available with the `test-helpers` feature).

use crate::application::ports::Clock;
use std::time::Instant;

/// Clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
