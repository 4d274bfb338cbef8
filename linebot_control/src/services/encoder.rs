//! Wheel encoder polling.

use crate::estimate::quadrature::QuadratureDecoder;
use crate::scheduler::Service;
use crate::state::VehicleState;
use linebot_common::hal::ports::{Clock, EncoderPort};
use linebot_common::mode::Mode;
use linebot_common::timing::IntervalGate;
use std::sync::Arc;
use std::time::Duration;

pub struct EncoderService {
    state: Arc<VehicleState>,
    port: Arc<dyn EncoderPort>,
    gate: IntervalGate,
    left: QuadratureDecoder,
    right: QuadratureDecoder,
}

impl EncoderService {
    pub fn new(
        state: Arc<VehicleState>,
        port: Arc<dyn EncoderPort>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            port,
            gate: IntervalGate::new(clock, interval),
            left: QuadratureDecoder::default(),
            right: QuadratureDecoder::default(),
        }
    }
}

impl Service for EncoderService {
    fn name(&self) -> &str {
        "encoder"
    }

    fn mask(&self) -> Mode {
        Mode::ALL
    }

    fn setup(&mut self) {
        let sample = self.port.sample();
        self.left.prime(sample.left());
        self.right.prime(sample.right());
        self.gate.reset();
    }

    fn cycle(&mut self) {
        if self.gate.poll().is_none() {
            return;
        }
        let sample = self.port.sample();
        self.left.update(sample.left());
        self.right.update(sample.right());
        self.state
            .set_encoders(self.left.position(), self.right.position());
    }
}
