//! Reflectance sensor sampling and normalization.

use crate::scheduler::Service;
use crate::state::VehicleState;
use linebot_common::consts::NUM_SENSORS;
use linebot_common::hal::ports::SensorPort;
use linebot_common::mode::Mode;
use std::sync::Arc;

/// Map a raw reading into `[0, 1]` between its calibration bounds.
///
/// A channel without a usable range (`high <= low`) reads 0.
#[inline]
pub fn normalize(raw: u16, low: u16, high: u16) -> f64 {
    if high <= low {
        return 0.0;
    }
    ((raw as f64 - low as f64) / (high as f64 - low as f64)).clamp(0.0, 1.0)
}

/// Reads one channel per tick, round-robin, then re-normalizes the array.
///
/// Channel conversions are slow on the real bus, so a full sweep spans
/// sixteen ticks.
pub struct SensorService {
    state: Arc<VehicleState>,
    port: Arc<dyn SensorPort>,
    next: usize,
}

impl SensorService {
    pub fn new(state: Arc<VehicleState>, port: Arc<dyn SensorPort>) -> Self {
        Self {
            state,
            port,
            next: 0,
        }
    }
}

impl Service for SensorService {
    fn name(&self) -> &str {
        "sensor"
    }

    fn mask(&self) -> Mode {
        Mode::ALL
    }

    fn cycle(&mut self) {
        let raw = self.port.read_channel(self.next);
        self.state.set_sensor_raw(self.next, raw);
        self.next = (self.next + 1) % NUM_SENSORS;

        for i in 0..NUM_SENSORS {
            let value = normalize(
                self.state.sensor_raw(i),
                self.state.sensor_low(i),
                self.state.sensor_high(i),
            );
            self.state.set_sensor_data(i, value);
        }
    }
}
