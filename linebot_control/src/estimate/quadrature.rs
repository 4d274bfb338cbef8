//! Quadrature encoder decoder.
//!
//! Each wheel delivers a two-bit sample `(A << 1) | B`. The table index is
//! `(previous << 2) | current`; single-line changes count ±1, no change and
//! both-lines-changed (a missed edge) count 0.

/// Signed count for every `(previous, current)` sample pair.
pub const DELTA_TABLE: [i8; 16] = [
    0, 1, -1, 0, //
    -1, 0, 0, 1, //
    1, 0, 0, -1, //
    0, -1, 1, 0, //
];

/// Count change for one transition between two-bit samples.
#[inline]
pub const fn delta(previous: u8, current: u8) -> i32 {
    DELTA_TABLE[(((previous & 0b11) << 2) | (current & 0b11)) as usize] as i32
}

/// Decoder state of one wheel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadratureDecoder {
    previous: u8,
    position: i32,
}

impl QuadratureDecoder {
    /// Start from `initial` so the first update does not count a spurious
    /// edge.
    pub fn new(initial: u8) -> Self {
        Self {
            previous: initial & 0b11,
            position: 0,
        }
    }

    /// Re-seed the previous sample without touching the count.
    pub fn prime(&mut self, sample: u8) {
        self.previous = sample & 0b11;
    }

    /// Decode one sample and return the change it contributed.
    #[inline]
    pub fn update(&mut self, sample: u8) -> i32 {
        let sample = sample & 0b11;
        let d = delta(self.previous, sample);
        self.previous = sample;
        self.position = self.position.wrapping_add(d);
        d
    }

    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }
}
