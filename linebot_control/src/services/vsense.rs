//! Battery voltage smoothing.

use crate::control::filters::LowPass;
use crate::scheduler::Service;
use crate::state::VehicleState;
use linebot_common::hal::ports::{Clock, VoltagePort};
use linebot_common::mode::Mode;
use linebot_common::timing::IntervalGate;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct VoltageService {
    state: Arc<VehicleState>,
    port: Arc<dyn VoltagePort>,
    gate: IntervalGate,
    filter: LowPass,
}

impl VoltageService {
    pub fn new(
        state: Arc<VehicleState>,
        port: Arc<dyn VoltagePort>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        alpha: f64,
    ) -> Self {
        Self {
            state,
            port,
            gate: IntervalGate::new(clock, interval),
            filter: LowPass::new(alpha),
        }
    }
}

impl Service for VoltageService {
    fn name(&self) -> &str {
        "vsense"
    }

    fn mask(&self) -> Mode {
        Mode::ALL
    }

    fn setup(&mut self) {
        let v = self.port.read();
        self.filter.prime(v);
        self.state.set_battery_voltage(v);
        self.gate.reset();
        debug!("Battery voltage primed at {v:.2} V");
    }

    fn cycle(&mut self) {
        if self.gate.poll().is_some() {
            let v = self.filter.apply(self.port.read());
            self.state.set_battery_voltage(v);
        }
    }
}
