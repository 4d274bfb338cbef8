//! Shared vehicle state.
//!
//! One record shared by every worker through an `Arc`. Fields are atomics
//! accessed with `Relaxed` ordering: readers may see a slightly stale value
//! but never a torn one. No ordering is implied between fields; the control
//! loops downstream are filtered and tolerate it.
//!
//! # Writers
//!
//! | Field | Writer |
//! |---|---|
//! | `sensor_raw`, `sensor_data` | sensor service |
//! | `sensor_low`, `sensor_high`, `calibrated` | calibration services, calibration load at start |
//! | `position` | line service (drive setup re-centres it, same worker) |
//! | `speed`, `last_marker`, `marker_count` | drive service |
//! | `battery_voltage` | voltage service |
//! | `encoder_left`, `encoder_right` | encoder service |

use crate::estimate::marker::Marker;
use linebot_common::calibration::Calibration;
use linebot_common::consts::NUM_SENSORS;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};

/// `f64` stored as its bit pattern in an `AtomicU64`.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub const fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }
}

/// Shared state handle. Zero-initialized, never reallocated.
#[derive(Debug)]
pub struct VehicleState {
    sensor_raw: [AtomicU16; NUM_SENSORS],
    sensor_data: [AtomicF64; NUM_SENSORS],
    sensor_low: [AtomicU16; NUM_SENSORS],
    sensor_high: [AtomicU16; NUM_SENSORS],
    calibrated: AtomicBool,
    position: AtomicF64,
    speed: AtomicF64,
    battery_voltage: AtomicF64,
    encoder_left: AtomicI32,
    encoder_right: AtomicI32,
    last_marker: AtomicU8,
    marker_count: AtomicU32,
}

/// Serializable copy of the vehicle state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub calibrated: bool,
    pub position: f64,
    pub speed: f64,
    pub battery_voltage: f64,
    pub encoder_left: i32,
    pub encoder_right: i32,
    pub last_marker: Marker,
    pub marker_count: u32,
    pub sensor_raw: [u16; NUM_SENSORS],
    pub sensor_data: [f64; NUM_SENSORS],
    pub sensor_low: [u16; NUM_SENSORS],
    pub sensor_high: [u16; NUM_SENSORS],
}

impl VehicleState {
    pub fn new() -> Self {
        Self {
            sensor_raw: std::array::from_fn(|_| AtomicU16::new(0)),
            sensor_data: std::array::from_fn(|_| AtomicF64::new(0.0)),
            sensor_low: std::array::from_fn(|_| AtomicU16::new(0)),
            sensor_high: std::array::from_fn(|_| AtomicU16::new(0)),
            calibrated: AtomicBool::new(false),
            position: AtomicF64::new(0.0),
            speed: AtomicF64::new(0.0),
            battery_voltage: AtomicF64::new(0.0),
            encoder_left: AtomicI32::new(0),
            encoder_right: AtomicI32::new(0),
            last_marker: AtomicU8::new(Marker::None as u8),
            marker_count: AtomicU32::new(0),
        }
    }

    // ─── Sensors ────────────────────────────────────────────────────

    #[inline]
    pub fn sensor_raw(&self, index: usize) -> u16 {
        self.sensor_raw[index].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_sensor_raw(&self, index: usize, raw: u16) {
        self.sensor_raw[index].store(raw, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_sensor_data(&self, index: usize, value: f64) {
        self.sensor_data[index].store(value);
    }

    /// Normalized readings of all channels.
    pub fn sensor_data(&self) -> [f64; NUM_SENSORS] {
        std::array::from_fn(|i| self.sensor_data[i].load())
    }

    // ─── Calibration ────────────────────────────────────────────────

    pub fn sensor_low(&self, index: usize) -> u16 {
        self.sensor_low[index].load(Ordering::Relaxed)
    }

    pub fn set_sensor_low(&self, index: usize, v: u16) {
        self.sensor_low[index].store(v, Ordering::Relaxed);
    }

    pub fn sensor_high(&self, index: usize) -> u16 {
        self.sensor_high[index].load(Ordering::Relaxed)
    }

    pub fn set_sensor_high(&self, index: usize, v: u16) {
        self.sensor_high[index].store(v, Ordering::Relaxed);
    }

    pub fn calibration(&self) -> Calibration {
        Calibration {
            low: std::array::from_fn(|i| self.sensor_low(i)),
            high: std::array::from_fn(|i| self.sensor_high(i)),
        }
    }

    /// Install loaded bounds and mark the vehicle calibrated.
    pub fn apply_calibration(&self, cal: &Calibration) {
        for i in 0..NUM_SENSORS {
            self.set_sensor_low(i, cal.low[i]);
            self.set_sensor_high(i, cal.high[i]);
        }
        self.set_calibrated(true);
    }

    pub fn calibrated(&self) -> bool {
        self.calibrated.load(Ordering::Relaxed)
    }

    pub fn set_calibrated(&self, on: bool) {
        self.calibrated.store(on, Ordering::Relaxed);
    }

    // ─── Estimates and commands ─────────────────────────────────────

    pub fn position(&self) -> f64 {
        self.position.load()
    }

    pub fn set_position(&self, v: f64) {
        self.position.store(v);
    }

    pub fn speed(&self) -> f64 {
        self.speed.load()
    }

    pub fn set_speed(&self, v: f64) {
        self.speed.store(v);
    }

    pub fn battery_voltage(&self) -> f64 {
        self.battery_voltage.load()
    }

    pub fn set_battery_voltage(&self, v: f64) {
        self.battery_voltage.store(v);
    }

    pub fn encoders(&self) -> (i32, i32) {
        (
            self.encoder_left.load(Ordering::Relaxed),
            self.encoder_right.load(Ordering::Relaxed),
        )
    }

    pub fn set_encoders(&self, left: i32, right: i32) {
        self.encoder_left.store(left, Ordering::Relaxed);
        self.encoder_right.store(right, Ordering::Relaxed);
    }

    pub fn last_marker(&self) -> Marker {
        Marker::from_u8(self.last_marker.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Record a detected marker.
    pub fn record_marker(&self, marker: Marker) {
        self.last_marker.store(marker as u8, Ordering::Relaxed);
        self.marker_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn marker_count(&self) -> u32 {
        self.marker_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        let (encoder_left, encoder_right) = self.encoders();
        VehicleSnapshot {
            calibrated: self.calibrated(),
            position: self.position(),
            speed: self.speed(),
            battery_voltage: self.battery_voltage(),
            encoder_left,
            encoder_right,
            last_marker: self.last_marker(),
            marker_count: self.marker_count(),
            sensor_raw: std::array::from_fn(|i| self.sensor_raw(i)),
            sensor_data: self.sensor_data(),
            sensor_low: std::array::from_fn(|i| self.sensor_low(i)),
            sensor_high: std::array::from_fn(|i| self.sensor_high(i)),
        }
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let s = VehicleState::new();
        let snap = s.snapshot();
        assert!(!snap.calibrated);
        assert_eq!(snap.position, 0.0);
        assert_eq!(snap.sensor_data, [0.0; NUM_SENSORS]);
        assert_eq!(snap.last_marker, Marker::None);
        assert_eq!(snap.marker_count, 0);
    }

    #[test]
    fn atomic_f64_roundtrip() {
        let a = AtomicF64::new(-1.25);
        assert_eq!(a.load(), -1.25);
        a.store(f64::NAN);
        assert!(a.load().is_nan());
    }

    #[test]
    fn calibration_apply_and_read_back() {
        let s = VehicleState::new();
        let mut cal = Calibration::default();
        cal.low[3] = 111;
        cal.high[3] = 3333;
        s.apply_calibration(&cal);
        assert!(s.calibrated());
        assert_eq!(s.calibration(), cal);
    }

    #[test]
    fn markers_are_counted() {
        let s = VehicleState::new();
        s.record_marker(Marker::Both);
        s.record_marker(Marker::Left);
        assert_eq!(s.last_marker(), Marker::Left);
        assert_eq!(s.marker_count(), 2);
    }

    #[test]
    fn shared_across_threads() {
        let s = std::sync::Arc::new(VehicleState::new());
        let w = s.clone();
        std::thread::spawn(move || w.set_encoders(10, -10))
            .join()
            .unwrap();
        assert_eq!(s.encoders(), (10, -10));
    }

    #[test]
    fn snapshot_serializes() {
        let s = VehicleState::new();
        s.set_position(0.5);
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["position"], 0.5);
        assert_eq!(json["last_marker"], "none");
        assert_eq!(json["sensor_raw"].as_array().unwrap().len(), NUM_SENSORS);
    }
}
