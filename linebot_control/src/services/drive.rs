//! Line following drive loop.
//!
//! Every tick feeds the marker detector. Every motor interval the service
//! derives per-wheel speed targets from the line position, ramps the cruise
//! speed, closes the wheel speed loops and writes battery-compensated duty
//! to the motors.
//!
//! The left motor is mounted mirrored, so its forward target is negative.

use crate::config::{DriveConfig, MarkerConfig};
use crate::control::pid::{PidController, PidState};
use crate::estimate::marker::{Marker, MarkerDetector};
use crate::scheduler::Service;
use crate::state::VehicleState;
use linebot_common::consts::{COUNTS_PER_REV, MOTOR_LIMIT};
use linebot_common::hal::ports::{Clock, MotorPort};
use linebot_common::mode::Mode;
use linebot_common::timing::IntervalGate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Limit a duty command to what the motor port accepts. `NaN` becomes 0.
#[inline]
fn clip(duty: f64) -> f64 {
    if duty.is_nan() {
        0.0
    } else {
        duty.clamp(-MOTOR_LIMIT, MOTOR_LIMIT)
    }
}

/// Move `current` toward `target` by at most `step`.
#[inline]
fn ramp(current: f64, target: f64, step: f64) -> f64 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}

pub struct DriveService {
    state: Arc<VehicleState>,
    motor: Arc<dyn MotorPort>,
    gate: IntervalGate,
    config: DriveConfig,
    detector: MarkerDetector,
    left: PidController,
    right: PidController,
    target_speed: f64,
    accel: f64,
    both_count: u32,
    prev_counts: (i32, i32),
}

impl DriveService {
    pub fn new(
        state: Arc<VehicleState>,
        motor: Arc<dyn MotorPort>,
        clock: Arc<dyn Clock>,
        config: DriveConfig,
        marker: &MarkerConfig,
    ) -> Self {
        let gate = IntervalGate::new(clock, Duration::from_micros(config.gate_us));
        Self {
            state,
            motor,
            gate,
            detector: MarkerDetector::new(marker.threshold, marker.side_offset, marker.trigger),
            left: PidController::new(config.pid),
            right: PidController::new(config.pid),
            target_speed: config.speed,
            accel: config.accel,
            both_count: 0,
            prev_counts: (0, 0),
            config,
        }
    }

    /// Cruise speed the ramp is heading for.
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    /// `Both` markers seen since the last setup.
    pub fn both_count(&self) -> u32 {
        self.both_count
    }

    /// Left and right wheel loop state.
    pub fn pid_states(&self) -> (&PidState, &PidState) {
        (self.left.state(), self.right.state())
    }

    fn on_marker(&mut self, marker: Marker) {
        self.state.record_marker(marker);
        info!("Marker: {marker}");
        if marker != Marker::Both {
            return;
        }
        self.both_count += 1;
        if self.config.stop_after_both != 0 && self.both_count == self.config.stop_after_both {
            info!("Finish marker reached after {} both markers, stopping", self.both_count);
            self.target_speed = 0.0;
            self.accel = self.config.stop_accel;
        }
    }
}

impl Service for DriveService {
    fn name(&self) -> &str {
        "drive"
    }

    fn mask(&self) -> Mode {
        Mode::DRIVE
    }

    fn setup(&mut self) {
        self.target_speed = self.config.speed;
        self.accel = self.config.accel;
        self.both_count = 0;
        self.left.reconfigure(self.config.pid);
        self.right.reconfigure(self.config.pid);
        self.detector.reset();
        self.prev_counts = self.state.encoders();
        self.state.set_position(0.0);
        self.state.set_speed(0.0);
        self.gate.reset();

        self.motor.set_velocity(0.0, 0.0);
        self.motor.enable(true);
        info!("Drive engaged, cruise {:.1} rev/s", self.target_speed);
    }

    fn cycle(&mut self) {
        let readings = self.state.sensor_data();
        let marker = self.detector.update(&readings, self.state.position());
        if marker != Marker::None {
            self.on_marker(marker);
        }

        let Some(dt_ns) = self.gate.poll() else {
            return;
        };
        let dt = dt_ns as f64 / 1e9;

        let position = self.state.position();
        let speed = self.state.speed();
        let steer = position * self.config.curvature;
        self.left.set_target(-speed * (1.0 + steer));
        self.right.set_target(speed * (1.0 - steer));

        self.state
            .set_speed(ramp(speed, self.target_speed, self.accel * dt));

        let (left_counts, right_counts) = self.state.encoders();
        let (prev_left, prev_right) = self.prev_counts;
        let cpr = COUNTS_PER_REV as f64;
        let left_speed = left_counts.wrapping_sub(prev_left) as f64 / cpr / dt;
        let right_speed = right_counts.wrapping_sub(prev_right) as f64 / cpr / dt;
        self.prev_counts = (left_counts, right_counts);

        let left_out = self.left.update(left_speed, dt);
        let right_out = self.right.update(right_speed, dt);

        let battery = self.state.battery_voltage();
        self.motor
            .set_velocity(clip(left_out / battery), clip(right_out / battery));
    }

    fn teardown(&mut self) {
        self.motor.set_velocity(0.0, 0.0);
        self.motor.enable(false);
        debug!("Drive released after {} both markers", self.both_count);
    }
}
