//! Track marker detector.
//!
//! Markers are short dark patches painted beside the line. An episode opens
//! when a marker comes under the array and resolves when it has passed; the
//! resolved episode is classified by which sides were dark.
//!
//! ```text
//!            trigger
//!   ┌──────┐ ───────► ┌──────────────┐
//!   │ Idle │          │ Accumulating │
//!   └──────┘ ◄─────── └──────────────┘
//!            no trigger → emit classification
//! ```

use linebot_common::consts::{NUM_SENSORS, sensor_position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default reading above which a sensor counts as dark.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default distance from the line beyond which a dark sensor is a side hit.
pub const DEFAULT_SIDE_OFFSET: f64 = 0.25;

/// Classification of a resolved episode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    None = 0,
    Right = 1,
    Left = 2,
    Both = 3,
    Cross = 4,
}

impl Marker {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Right),
            2 => Some(Self::Left),
            3 => Some(Self::Both),
            4 => Some(Self::Cross),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Right => "right",
            Self::Left => "left",
            Self::Both => "both",
            Self::Cross => "cross",
        };
        f.write_str(s)
    }
}

/// What keeps an episode open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerTrigger {
    /// Any dark sensor opens and holds an episode.
    #[default]
    Any,
    /// Only dark sensors classified left or right do; the line itself never
    /// holds an episode open.
    Side,
}

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    #[default]
    Idle,
    Accumulating,
}

/// Marker detector state machine.
#[derive(Debug, Clone)]
pub struct MarkerDetector {
    threshold: f64,
    side_offset: f64,
    trigger: MarkerTrigger,
    state: DetectorState,
    seen: [bool; NUM_SENSORS],
    saw_left: bool,
    saw_right: bool,
}

impl MarkerDetector {
    pub fn new(threshold: f64, side_offset: f64, trigger: MarkerTrigger) -> Self {
        Self {
            threshold,
            side_offset,
            trigger,
            state: DetectorState::Idle,
            seen: [false; NUM_SENSORS],
            saw_left: false,
            saw_right: false,
        }
    }

    /// Back to `Idle` with an empty episode.
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.clear_episode();
    }

    fn clear_episode(&mut self) {
        self.seen = [false; NUM_SENSORS];
        self.saw_left = false;
        self.saw_right = false;
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Feed one tick of normalized readings with the current line estimate.
    ///
    /// Returns the classification when an episode resolves on this tick,
    /// `Marker::None` otherwise.
    pub fn update(&mut self, readings: &[f64; NUM_SENSORS], position: f64) -> Marker {
        let mut any_dark = false;
        let mut side_dark = false;

        for (i, &reading) in readings.iter().enumerate() {
            if reading <= self.threshold {
                continue;
            }
            any_dark = true;
            self.seen[i] = true;
            let at = sensor_position(i);
            if at < position - self.side_offset {
                self.saw_left = true;
                side_dark = true;
            } else if at > position + self.side_offset {
                self.saw_right = true;
                side_dark = true;
            }
        }

        let triggered = match self.trigger {
            MarkerTrigger::Any => any_dark,
            MarkerTrigger::Side => side_dark,
        };

        match self.state {
            DetectorState::Idle => {
                if triggered {
                    self.state = DetectorState::Accumulating;
                } else {
                    self.clear_episode();
                }
                Marker::None
            }
            DetectorState::Accumulating => {
                if triggered {
                    return Marker::None;
                }
                self.state = DetectorState::Idle;
                let marker = self.classify();
                self.clear_episode();
                marker
            }
        }
    }

    fn classify(&self) -> Marker {
        if self.seen.iter().all(|&s| s) {
            Marker::Cross
        } else if self.saw_left && self.saw_right {
            Marker::Both
        } else if self.saw_left {
            Marker::Left
        } else if self.saw_right {
            Marker::Right
        } else {
            Marker::None
        }
    }
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_SIDE_OFFSET, MarkerTrigger::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: [f64; NUM_SENSORS] = [0.0; NUM_SENSORS];

    fn dark(indices: impl IntoIterator<Item = usize>) -> [f64; NUM_SENSORS] {
        let mut r = CLEAR;
        for i in indices {
            r[i] = 1.0;
        }
        r
    }

    /// One episode: the pattern for a tick, then a clear tick.
    fn episode(det: &mut MarkerDetector, pattern: &[f64; NUM_SENSORS], position: f64) -> Marker {
        assert_eq!(det.update(pattern, position), Marker::None);
        assert_eq!(det.state(), DetectorState::Accumulating);
        det.update(&CLEAR, position)
    }

    #[test]
    fn left_half_resolves_left() {
        let mut det = MarkerDetector::default();
        assert_eq!(episode(&mut det, &dark(0..8), 0.0), Marker::Left);
        assert_eq!(det.state(), DetectorState::Idle);
    }

    #[test]
    fn right_patch_resolves_right() {
        let mut det = MarkerDetector::default();
        assert_eq!(episode(&mut det, &dark(12..16), 0.0), Marker::Right);
    }

    #[test]
    fn all_sensors_resolve_cross() {
        let mut det = MarkerDetector::default();
        assert_eq!(episode(&mut det, &dark(0..16), 0.0), Marker::Cross);
    }

    #[test]
    fn split_sides_resolve_both() {
        let mut det = MarkerDetector::default();
        assert_eq!(
            episode(&mut det, &dark((0..4).chain(12..16)), 0.0),
            Marker::Both
        );
    }

    #[test]
    fn sides_seen_on_different_ticks_accumulate() {
        let mut det = MarkerDetector::default();
        assert_eq!(det.update(&dark(0..3), 0.0), Marker::None);
        assert_eq!(det.update(&dark(13..16), 0.0), Marker::None);
        assert_eq!(det.update(&CLEAR, 0.0), Marker::Both);
    }

    #[test]
    fn centre_only_resolves_none() {
        let mut det = MarkerDetector::default();
        assert_eq!(episode(&mut det, &dark(7..9), 0.0), Marker::None);
    }

    #[test]
    fn episode_holds_until_clear() {
        let mut det = MarkerDetector::default();
        for _ in 0..5 {
            assert_eq!(det.update(&dark(0..4), 0.0), Marker::None);
        }
        assert_eq!(det.update(&CLEAR, 0.0), Marker::Left);
        // Nothing left over for the next episode.
        assert_eq!(det.update(&CLEAR, 0.0), Marker::None);
        assert_eq!(episode(&mut det, &dark(13..16), 0.0), Marker::Right);
    }

    #[test]
    fn sides_are_relative_to_line() {
        let mut det = MarkerDetector::default();
        // Line at +0.8: sensors 8..12 (0.07..0.6) are left of it.
        assert_eq!(episode(&mut det, &dark(8..12), 0.8), Marker::Left);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut det = MarkerDetector::default();
        let mut r = CLEAR;
        r[0] = DEFAULT_THRESHOLD;
        det.update(&r, 0.0);
        assert_eq!(det.state(), DetectorState::Idle);
    }

    #[test]
    fn side_trigger_ignores_line() {
        let mut det = MarkerDetector::new(DEFAULT_THRESHOLD, DEFAULT_SIDE_OFFSET, MarkerTrigger::Side);
        let line = dark(7..9);
        for _ in 0..3 {
            assert_eq!(det.update(&line, 0.0), Marker::None);
            assert_eq!(det.state(), DetectorState::Idle);
        }
        // Marker beside the line while the line stays dark.
        let mut with_marker = line;
        with_marker[1] = 1.0;
        with_marker[2] = 1.0;
        assert_eq!(det.update(&with_marker, 0.0), Marker::None);
        assert_eq!(det.state(), DetectorState::Accumulating);
        assert_eq!(det.update(&line, 0.0), Marker::Left);
    }

    #[test]
    fn side_trigger_still_detects_cross() {
        let mut det = MarkerDetector::new(DEFAULT_THRESHOLD, DEFAULT_SIDE_OFFSET, MarkerTrigger::Side);
        assert_eq!(det.update(&dark(0..16), 0.0), Marker::None);
        assert_eq!(det.update(&dark(7..9), 0.0), Marker::Cross);
    }

    #[test]
    fn reset_discards_open_episode() {
        let mut det = MarkerDetector::default();
        det.update(&dark(0..4), 0.0);
        det.reset();
        assert_eq!(det.state(), DetectorState::Idle);
        assert_eq!(det.update(&CLEAR, 0.0), Marker::None);
    }

    #[test]
    fn marker_codes() {
        for code in 0..=4u8 {
            assert_eq!(Marker::from_u8(code).unwrap() as u8, code);
        }
        assert_eq!(Marker::from_u8(5), None);
        assert_eq!(Marker::Both.to_string(), "both");
    }
}
