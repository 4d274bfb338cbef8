//! Port implementations backed by the vehicle model.
//!
//! The model is advanced lazily: every port call first integrates the
//! physics up to the current clock reading, so the simulation runs at
//! whatever rate the workers poll it.

use super::physics::VehicleModel;
use linebot_common::consts::{MOTOR_LIMIT, NUM_SENSORS};
use linebot_common::hal::config::HalConfig;
use linebot_common::hal::ports::{
    Clock, EncoderPort, MotorPort, QuadratureSample, SensorPort, VoltagePort,
};
use parking_lot::Mutex;
use std::sync::Arc;

struct Inner {
    model: VehicleModel,
    last_ns: u64,
}

/// Simulated vehicle exposing every HAL port.
pub struct SimulatedVehicle {
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl SimulatedVehicle {
    pub fn new(config: &HalConfig, clock: Arc<dyn Clock>) -> Self {
        let last_ns = clock.now_ns();
        Self {
            clock,
            inner: Mutex::new(Inner {
                model: VehicleModel::new(config),
                last_ns,
            }),
        }
    }

    /// Run `f` against the model after bringing it up to date.
    fn with_model<R>(&self, f: impl FnOnce(&mut VehicleModel) -> R) -> R {
        let now = self.clock.now_ns();
        let mut inner = self.inner.lock();
        let dt_ns = now.saturating_sub(inner.last_ns);
        if dt_ns > 0 {
            inner.model.step(dt_ns as f64 * 1e-9);
            inner.last_ns = now;
        }
        f(&mut inner.model)
    }

    /// Distance travelled along the track, in metres.
    pub fn distance(&self) -> f64 {
        self.with_model(|m| m.distance())
    }

    /// Line position as the array would ideally see it.
    pub fn line_position(&self) -> f64 {
        self.with_model(|m| m.line_position())
    }

    pub fn motors_enabled(&self) -> bool {
        self.with_model(|m| m.enabled())
    }
}

impl Clock for SimulatedVehicle {
    fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }
}

impl MotorPort for SimulatedVehicle {
    fn set_velocity(&self, left: f64, right: f64) {
        let left = left.clamp(-MOTOR_LIMIT, MOTOR_LIMIT);
        let right = right.clamp(-MOTOR_LIMIT, MOTOR_LIMIT);
        self.with_model(|m| m.set_duty(left, right));
    }

    fn enable(&self, on: bool) {
        self.with_model(|m| m.set_enabled(on));
    }
}

impl EncoderPort for SimulatedVehicle {
    fn sample(&self) -> QuadratureSample {
        self.with_model(|m| {
            let (left_a, left_b) = m.encoder_levels(0);
            let (right_a, right_b) = m.encoder_levels(1);
            QuadratureSample {
                left_a,
                left_b,
                right_a,
                right_b,
            }
        })
    }
}

impl SensorPort for SimulatedVehicle {
    fn read_channel(&self, index: usize) -> u16 {
        if index >= NUM_SENSORS {
            return 0;
        }
        self.with_model(|m| m.raw_channel(index))
    }
}

impl VoltagePort for SimulatedVehicle {
    fn read(&self) -> f64 {
        self.with_model(|m| m.battery_voltage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linebot_common::hal::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn model_advances_with_clock() {
        let clock = Arc::new(ManualClock::new(0));
        let vehicle = SimulatedVehicle::new(&HalConfig::default(), clock.clone());

        vehicle.enable(true);
        vehicle.set_velocity(-0.5, 0.5);
        assert_eq!(vehicle.distance(), 0.0);

        clock.advance(Duration::from_millis(200));
        assert!(vehicle.distance() > 0.0);
    }

    #[test]
    fn duty_is_clipped() {
        let clock = Arc::new(ManualClock::new(0));
        let fast = SimulatedVehicle::new(&HalConfig::default(), clock.clone());
        let clipped = SimulatedVehicle::new(&HalConfig::default(), clock.clone());

        fast.enable(true);
        clipped.enable(true);
        fast.set_velocity(-5.0, 5.0);
        clipped.set_velocity(-MOTOR_LIMIT, MOTOR_LIMIT);
        clock.advance(Duration::from_millis(100));
        assert!((fast.distance() - clipped.distance()).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_channel_reads_zero() {
        let vehicle = SimulatedVehicle::new(&HalConfig::default(), Arc::new(ManualClock::new(0)));
        assert_eq!(vehicle.read_channel(NUM_SENSORS), 0);
    }
}
