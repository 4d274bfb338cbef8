//! Fixed-interval gate.
//!
//! Periodic services call [`IntervalGate::poll`] every scheduling tick; the
//! gate fires at most once per interval and reports the time since it last
//! fired, which the caller uses as its `dt`.

use crate::hal::ports::Clock;
use std::sync::Arc;
use std::time::Duration;

pub struct IntervalGate {
    clock: Arc<dyn Clock>,
    interval_ns: u64,
    last_ns: u64,
}

impl IntervalGate {
    /// Create a gate whose first firing is one interval from now.
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        let last_ns = clock.now_ns();
        Self {
            clock,
            interval_ns: interval.as_nanos() as u64,
            last_ns,
        }
    }

    /// Returns the elapsed nanoseconds if at least one interval has passed
    /// since the last firing, restarting the interval from now.
    ///
    /// Missed intervals are not caught up: a late poll fires once with the
    /// full elapsed time.
    pub fn poll(&mut self) -> Option<u64> {
        let now = self.clock.now_ns();
        let elapsed = now.saturating_sub(self.last_ns);
        if elapsed >= self.interval_ns {
            self.last_ns = now;
            Some(elapsed)
        } else {
            None
        }
    }

    /// Restart the interval from now.
    pub fn reset(&mut self) {
        self.last_ns = self.clock.now_ns();
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns)
    }
}
