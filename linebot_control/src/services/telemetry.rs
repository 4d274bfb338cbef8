//! Periodic status summary in the log.

use crate::scheduler::{GlobalContext, Service};
use crate::state::VehicleState;
use linebot_common::hal::ports::Clock;
use linebot_common::mode::Mode;
use linebot_common::timing::IntervalGate;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct TelemetryService {
    state: Arc<VehicleState>,
    global: Arc<GlobalContext>,
    gate: IntervalGate,
}

impl TelemetryService {
    pub fn new(
        state: Arc<VehicleState>,
        global: Arc<GlobalContext>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            global,
            gate: IntervalGate::new(clock, interval),
        }
    }
}

impl Service for TelemetryService {
    fn name(&self) -> &str {
        "telemetry"
    }

    fn mask(&self) -> Mode {
        Mode::ALL
    }

    fn cycle(&mut self) {
        if self.gate.poll().is_none() {
            return;
        }
        let (left, right) = self.state.encoders();
        debug!(
            mode = %self.global.current_mode(),
            position = self.state.position(),
            speed = self.state.speed(),
            battery = self.state.battery_voltage(),
            encoder_left = left,
            encoder_right = right,
            markers = self.state.marker_count(),
            calibrated = self.state.calibrated(),
            "status"
        );
    }
}
