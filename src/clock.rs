//! Monotonic clock abstraction for timing measurements
//!
//! The harness never reads wall-clock time directly; it goes through the
//! [`Clock`] trait so tests can drive the measurement loop deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonically non-decreasing nanosecond timestamps.
///
/// The epoch is arbitrary; only differences between two readings are
/// meaningful. Implementations must never go backward within a process
/// lifetime.
pub trait Clock: Send + Sync {
    /// Elapsed nanoseconds since an arbitrary epoch.
    fn now_ns(&self) -> u64;
}

/// Default clock backed by `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        // u64 nanoseconds covers ~584 years from the epoch instant.
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Deterministic clock for tests: every reading advances by a fixed step.
///
/// A step of 0 freezes time, which lets tests exercise the iteration bounds
/// of the harness without any dependence on host speed.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    /// Clock that advances `step_ns` on every `now_ns()` call.
    pub fn with_step(step_ns: u64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicU64::new(0),
            step: step_ns,
        })
    }

    /// Advance time manually, independent of readings.
    pub fn advance(&self, delta_ns: u64) {
        self.now.fetch_add(delta_ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_goes_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.now_ns();
        for _ in 0..1000 {
            let now = clock.now_ns();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_manual_clock_fixed_step() {
        let clock = ManualClock::with_step(100);
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert_eq!(b - a, 100);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::with_step(0);
        let a = clock.now_ns();
        clock.advance(5_000);
        let b = clock.now_ns();
        assert_eq!(b - a, 5_000);
    }
}
