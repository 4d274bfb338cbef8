//! Tick timing statistics.

use serde::Serialize;

/// Per-worker tick duration statistics. O(1) record, no allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick duration [ns].
    pub last_tick_ns: u64,
    /// Minimum tick duration [ns].
    pub min_tick_ns: u64,
    /// Maximum tick duration [ns].
    pub max_tick_ns: u64,
    /// Running sum for the average.
    pub sum_tick_ns: u64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            min_tick_ns: u64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.tick_count += 1;
        self.last_tick_ns = duration_ns;
        self.min_tick_ns = self.min_tick_ns.min(duration_ns);
        self.max_tick_ns = self.max_tick_ns.max(duration_ns);
        self.sum_tick_ns = self.sum_tick_ns.saturating_add(duration_ns);
    }

    /// Average tick time [ns] (0 if no ticks).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}
