//! Calibration capture.
//!
//! While the vehicle sits over white (low) or black (high) the matching
//! service records the largest raw reading of every channel. Leaving the
//! mode stores the bounds to the calibration file.

use crate::scheduler::Service;
use crate::state::VehicleState;
use linebot_common::consts::NUM_SENSORS;
use linebot_common::hal::ports::SensorPort;
use linebot_common::mode::Mode;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Which calibration bound a service captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Low,
    High,
}

pub struct CalibrationService {
    bound: Bound,
    state: Arc<VehicleState>,
    port: Arc<dyn SensorPort>,
    path: PathBuf,
}

impl CalibrationService {
    pub fn new(
        bound: Bound,
        state: Arc<VehicleState>,
        port: Arc<dyn SensorPort>,
        path: PathBuf,
    ) -> Self {
        Self {
            bound,
            state,
            port,
            path,
        }
    }

    fn get(&self, i: usize) -> u16 {
        match self.bound {
            Bound::Low => self.state.sensor_low(i),
            Bound::High => self.state.sensor_high(i),
        }
    }

    fn set(&self, i: usize, v: u16) {
        match self.bound {
            Bound::Low => self.state.set_sensor_low(i, v),
            Bound::High => self.state.set_sensor_high(i, v),
        }
    }
}

impl Service for CalibrationService {
    fn name(&self) -> &str {
        match self.bound {
            Bound::Low => "calibrate_low",
            Bound::High => "calibrate_high",
        }
    }

    fn mask(&self) -> Mode {
        match self.bound {
            Bound::Low => Mode::CALIBRATE_LOW,
            Bound::High => Mode::CALIBRATE_HIGH,
        }
    }

    fn setup(&mut self) {
        info!("Capturing {:?} calibration bound", self.bound);
        for i in 0..NUM_SENSORS {
            self.set(i, 0);
        }
        self.state.set_calibrated(false);
    }

    fn cycle(&mut self) {
        for i in 0..NUM_SENSORS {
            let raw = self.port.read_channel(i);
            if raw > self.get(i) {
                self.set(i, raw);
            }
        }
    }

    fn teardown(&mut self) {
        let cal = self.state.calibration();
        let complete = (0..NUM_SENSORS).all(|i| cal.channel_valid(i));
        self.state.set_calibrated(complete);
        if !complete {
            warn!("Calibration incomplete: some channels have high <= low");
        }
        if let Err(e) = cal.save(&self.path) {
            warn!("Failed to save calibration: {e}");
        }
    }
}
