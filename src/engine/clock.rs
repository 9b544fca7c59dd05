//! Monotonic time source.
//!
//! The engine accounts for deferred-event delays and state residency in
//! microseconds against a monotonic clock. The clock is a trait so tests
//! and unusual targets can substitute their own time source.

use std::time::Instant;

/// Monotonic microsecond time source.
pub trait Clock: Send {
    /// Microseconds elapsed since an arbitrary fixed origin.
    fn now_micros(&self) -> u64;
}

/// Default clock backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock with its origin at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}
