//! Line position update.

use crate::estimate::line::LineEstimator;
use crate::scheduler::Service;
use crate::state::VehicleState;
use linebot_common::mode::Mode;
use std::sync::Arc;

pub struct LineService {
    state: Arc<VehicleState>,
    estimator: LineEstimator,
}

impl LineService {
    pub fn new(state: Arc<VehicleState>, estimator: LineEstimator) -> Self {
        Self { state, estimator }
    }
}

impl Service for LineService {
    fn name(&self) -> &str {
        "line"
    }

    fn mask(&self) -> Mode {
        Mode::ALL
    }

    fn cycle(&mut self) {
        let readings = self.state.sensor_data();
        let position = self.estimator.estimate(&readings, self.state.position());
        self.state.set_position(position);
    }
}
