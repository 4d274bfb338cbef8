//! Kinematic model of the vehicle on a straight track.
//!
//! Frame conventions:
//! - `lateral` is the vehicle's offset from the line in metres, positive
//!   when the vehicle sits left of the line.
//! - `heading` is the angle to the line in radians, positive turning left.
//! - The left motor is mounted mirrored: negative left duty drives forward.
//! - Line position as seen by the array is in array units, positive when the
//!   line is to the right of the array centre, `±1` under the outer sensors.

use linebot_common::consts::{SENSOR_RAW_MAX, sensor_position};
use linebot_common::hal::config::HalConfig;

/// Wheel circumference in metres.
const WHEEL_CIRCUMFERENCE: f64 = 0.1;
/// Distance between the wheels in metres.
const WHEEL_BASE: f64 = 0.12;
/// Distance from the axle to the sensor array in metres.
const ARRAY_OFFSET: f64 = 0.08;
/// Half-width of the sensor array in metres.
const ARRAY_HALF_WIDTH: f64 = 0.05;
/// Steady-state wheel speed per applied volt (rev/s/V).
const MOTOR_GAIN: f64 = 3.0;
/// Wheel speed time constant in seconds.
const MOTOR_TAU: f64 = 0.05;
/// Battery sag per unit of average duty, in volts.
const BATTERY_SAG: f64 = 0.4;
/// Largest integration step in seconds.
const MAX_STEP: f64 = 0.001;
/// Length of a marker patch along the track, in metres.
const MARKER_LENGTH: f64 = 0.03;
/// Lateral extent of a side marker patch, in array units from the line.
const MARKER_INNER: f64 = 0.45;
const MARKER_OUTER: f64 = 0.9;

/// Which side(s) of the line a track marker is painted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSide {
    Left,
    Right,
    Both,
    /// Full-width stripe across the line.
    Cross,
}

/// Marker patches along the track: `(distance from start in m, side)`.
///
/// Start and finish are `Both` pairs; the drive stops after the second one.
pub const TRACK_MARKERS: &[(f64, MarkerSide)] = &[
    (0.3, MarkerSide::Both),
    (1.2, MarkerSide::Right),
    (2.0, MarkerSide::Cross),
    (2.8, MarkerSide::Left),
    (4.0, MarkerSide::Both),
];

/// Continuous vehicle state and the commands applied to it.
#[derive(Debug, Clone)]
pub struct VehicleModel {
    lateral: f64,
    heading: f64,
    distance: f64,
    /// Wheel speeds in rev/s (motor frame, left mirrored).
    wheel_speed: [f64; 2],
    /// Wheel angles in revolutions (motor frame).
    wheel_angle: [f64; 2],
    duty: [f64; 2],
    enabled: bool,
    nominal_voltage: f64,
    counts_per_rev: u32,
}

impl VehicleModel {
    pub fn new(config: &HalConfig) -> Self {
        Self {
            lateral: config.initial_offset * ARRAY_HALF_WIDTH,
            heading: config.initial_heading,
            distance: 0.0,
            wheel_speed: [0.0; 2],
            wheel_angle: [0.0; 2],
            duty: [0.0; 2],
            enabled: false,
            nominal_voltage: config.battery_voltage,
            counts_per_rev: config.counts_per_rev,
        }
    }

    pub fn set_duty(&mut self, left: f64, right: f64) {
        self.duty = [left, right];
    }

    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn wheel_speed(&self) -> [f64; 2] {
        self.wheel_speed
    }

    /// Battery voltage under the current load.
    pub fn battery_voltage(&self) -> f64 {
        let load = if self.enabled {
            (self.duty[0].abs() + self.duty[1].abs()) * 0.5
        } else {
            0.0
        };
        self.nominal_voltage - BATTERY_SAG * load
    }

    /// Line position relative to the array centre, in array units.
    pub fn line_position(&self) -> f64 {
        (self.lateral + ARRAY_OFFSET * self.heading.sin()) / ARRAY_HALF_WIDTH
    }

    /// Advance the model by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        let mut remaining = dt;
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP);
            self.integrate(h);
            remaining -= h;
        }
    }

    fn integrate(&mut self, h: f64) {
        let volts = self.battery_voltage();
        for side in 0..2 {
            let applied = if self.enabled { self.duty[side] } else { 0.0 };
            let target = applied * volts * MOTOR_GAIN;
            self.wheel_speed[side] += (target - self.wheel_speed[side]) * (h / MOTOR_TAU).min(1.0);
            self.wheel_angle[side] += self.wheel_speed[side] * h;
        }

        let forward_left = -self.wheel_speed[0] * WHEEL_CIRCUMFERENCE;
        let forward_right = self.wheel_speed[1] * WHEEL_CIRCUMFERENCE;
        let speed = (forward_left + forward_right) * 0.5;
        let yaw_rate = (forward_right - forward_left) / WHEEL_BASE;

        self.heading += yaw_rate * h;
        self.lateral += speed * self.heading.sin() * h;
        self.distance += speed * self.heading.cos() * h;
    }

    /// Reflectance of the track under sensor `index`, `0` white to `1` black.
    pub fn reflectance(&self, index: usize) -> f64 {
        let offset = sensor_position(index) - self.line_position();
        let line = (1.0 - 3.0 * offset.abs()).max(0.0);
        let marker = self.marker_under(offset);
        line.max(marker)
    }

    fn marker_under(&self, offset: f64) -> f64 {
        // The array leads the axle.
        let along = self.distance + ARRAY_OFFSET;
        for &(at, side) in TRACK_MARKERS {
            if along < at || along > at + MARKER_LENGTH {
                continue;
            }
            let on_left = (-MARKER_OUTER..=-MARKER_INNER).contains(&offset);
            let on_right = (MARKER_INNER..=MARKER_OUTER).contains(&offset);
            let hit = match side {
                MarkerSide::Left => on_left,
                MarkerSide::Right => on_right,
                MarkerSide::Both => on_left || on_right,
                MarkerSide::Cross => true,
            };
            if hit {
                return 1.0;
            }
        }
        0.0
    }

    /// 12-bit raw reading of sensor `index`.
    ///
    /// Each channel has its own white and black level so calibration has
    /// something to correct.
    pub fn raw_channel(&self, index: usize) -> u16 {
        let white = 250.0 + 12.0 * index as f64;
        let black = 3600.0 - 20.0 * index as f64;
        let raw = white + (black - white) * self.reflectance(index);
        raw.clamp(0.0, SENSOR_RAW_MAX as f64) as u16
    }

    /// Encoder count of wheel `side` (0 = left, 1 = right).
    pub fn encoder_count(&self, side: usize) -> i64 {
        (self.wheel_angle[side] * self.counts_per_rev as f64).floor() as i64
    }

    /// Two-bit Gray-code level `(A << 1) | B` of wheel `side`.
    pub fn encoder_levels(&self, side: usize) -> (bool, bool) {
        const GRAY: [u8; 4] = [0b00, 0b01, 0b11, 0b10];
        let code = GRAY[self.encoder_count(side).rem_euclid(4) as usize];
        (code & 0b10 != 0, code & 0b01 != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(offset: f64) -> VehicleModel {
        VehicleModel::new(&HalConfig {
            initial_offset: offset,
            ..Default::default()
        })
    }

    #[test]
    fn line_under_centre_reads_dark_centre() {
        let m = model(0.0);
        // Centre sensors 7/8 straddle the line.
        assert!(m.reflectance(7) > 0.7);
        assert!(m.reflectance(8) > 0.7);
        assert_eq!(m.reflectance(0), 0.0);
        assert_eq!(m.reflectance(15), 0.0);
    }

    #[test]
    fn raw_values_follow_reflectance() {
        let m = model(1.0);
        assert!(m.raw_channel(15) > 3000);
        assert!(m.raw_channel(0) < 500);
    }

    #[test]
    fn disabled_motors_do_not_move() {
        let mut m = model(0.0);
        m.set_duty(-0.5, 0.5);
        m.step(0.5);
        assert_eq!(m.distance(), 0.0);
        assert_eq!(m.encoder_count(0), 0);
    }

    #[test]
    fn forward_duty_drives_forward() {
        let mut m = model(0.0);
        m.set_enabled(true);
        m.set_duty(-0.3, 0.3);
        m.step(0.5);
        assert!(m.distance() > 0.0);
        assert!(m.encoder_count(0) < 0);
        assert!(m.encoder_count(1) > 0);
        // Equal and opposite duty keeps the vehicle straight.
        assert!(m.line_position().abs() < 1e-9);
    }

    #[test]
    fn faster_left_wheel_turns_right() {
        let mut m = model(0.0);
        m.set_enabled(true);
        m.set_duty(-0.5, 0.2);
        m.step(0.3);
        // Vehicle veers right, so the line appears to the left.
        assert!(m.line_position() < 0.0);
    }

    #[test]
    fn gray_code_sequence_forward() {
        let mut m = model(0.0);
        let mut levels = Vec::new();
        for i in 0..5 {
            m.wheel_angle[1] = (i as f64 + 0.5) / m.counts_per_rev as f64;
            levels.push(m.encoder_levels(1));
        }
        assert_eq!(
            levels,
            vec![
                (false, false),
                (false, true),
                (true, true),
                (true, false),
                (false, false)
            ]
        );
    }

    #[test]
    fn load_sags_battery() {
        let mut m = model(0.0);
        let idle = m.battery_voltage();
        m.set_enabled(true);
        m.set_duty(-0.9, 0.9);
        assert!(m.battery_voltage() < idle);
    }

    #[test]
    fn marker_patch_darkens_side_sensors() {
        let mut m = model(0.0);
        let (at, side) = TRACK_MARKERS[0];
        assert_eq!(side, MarkerSide::Both);
        m.distance = at - ARRAY_OFFSET + MARKER_LENGTH * 0.5;
        assert_eq!(m.reflectance(2), 1.0);
        assert_eq!(m.reflectance(13), 1.0);
        m.distance = at + 0.5;
        assert_eq!(m.reflectance(2), 0.0);
    }
}
