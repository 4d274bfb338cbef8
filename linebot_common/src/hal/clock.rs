//! Clock implementations.

use crate::hal::ports::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Wall clock backed by `std::time::Instant`, origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
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
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Clock that only moves when told to. Used by tests and replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ns),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn set_ns(&self, ns: u64) {
        self.now.store(ns, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now_ns();
        std::thread::sleep(Duration::from_millis(1));
        let b = clock.now_ns();
        assert!(b > a);
        assert!(clock.elapsed_ns(a) >= 1_000_000);
    }

    #[test]
    fn manual_clock_advances_on_request() {
        let clock = ManualClock::new(500);
        assert_eq!(clock.now_ns(), 500);
        clock.advance(Duration::from_micros(2));
        assert_eq!(clock.now_ns(), 2_500);
        assert_eq!(clock.elapsed_ns(500), 2_000);
        // Elapsed never underflows.
        assert_eq!(clock.elapsed_ns(10_000), 0);
    }
}
