//! PID controller with rectangular integration and raw backward-difference
//! derivative.
//!
//! No windup clamp and no `dt` validation: `dt == 0` makes the derivative
//! term divide by zero and the output becomes `±Inf` or `NaN`. Callers only
//! update from an interval gate, which never reports a zero interval once
//! its period is non-zero.

use serde::{Deserialize, Serialize};

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        // Wheel speed loop tuned on the vehicle.
        Self {
            kp: 3.0,
            ki: 100.0,
            kd: 0.0,
        }
    }
}

/// Internal state of the PID controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// Setpoint.
    pub target: f64,
    /// Error of the previous update.
    pub prev_error: f64,
    /// Sum of `error * dt` over all updates.
    pub accumulated_error: f64,
}

impl PidState {
    /// Reset setpoint and accumulators to zero.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Compute one PID update.
///
/// # Returns
/// `kp * e + ki * Σ(e·dt) + kd * Δe/dt` with `e = target - measured`.
#[inline]
pub fn pid_update(state: &mut PidState, gains: &PidGains, measured: f64, dt: f64) -> f64 {
    let error = state.target - measured;
    state.accumulated_error += error * dt;
    let derivative = (error - state.prev_error) / dt;
    state.prev_error = error;

    gains.kp * error + gains.ki * state.accumulated_error + gains.kd * derivative
}

/// Gains and state of one control axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidController {
    gains: PidGains,
    state: PidState,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            state: PidState::default(),
        }
    }

    #[inline]
    pub fn update(&mut self, measured: f64, dt: f64) -> f64 {
        pid_update(&mut self.state, &self.gains, measured, dt)
    }

    /// Zero target and accumulators, keep gains.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Replace the gains and reset.
    pub fn reconfigure(&mut self, gains: PidGains) {
        self.gains = gains;
        self.state.reset();
    }

    pub fn target(&self) -> f64 {
        self.state.target
    }

    pub fn set_target(&mut self, target: f64) {
        self.state.target = target;
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn state(&self) -> &PidState {
        &self.state
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.001; // 1 kHz drive gate

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains { kp, ki, kd }
    }

    #[test]
    fn pure_proportional() {
        let mut pid = PidController::new(gains(1.0, 0.0, 0.0));
        pid.set_target(10.0);
        let out = pid.update(0.0, 1.0);
        assert!((out - 10.0).abs() < 1e-12);
    }

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = PidController::new(gains(0.0, 100.0, 0.0));
        pid.set_target(2.0);
        let n = 25;
        for _ in 0..n {
            pid.update(0.5, DT);
        }
        // error = 1.5 for every tick
        let expected = 1.5 * n as f64 * DT;
        assert!((pid.state().accumulated_error - expected).abs() < 1e-12);

        let out = pid.update(0.5, DT);
        assert!((out - 100.0 * (expected + 1.5 * DT)).abs() < 1e-9);
    }

    #[test]
    fn derivative_responds_to_error_change() {
        let mut pid = PidController::new(gains(0.0, 0.0, 1.0));
        // First update: error 0 → derivative 0.
        assert!(pid.update(0.0, DT).abs() < 1e-12);
        // Step the target: derivative = (1 - 0) / 0.001.
        pid.set_target(1.0);
        let out = pid.update(0.0, DT);
        assert!((out - 1000.0).abs() < 1e-8);
    }

    #[test]
    fn first_update_sees_full_error_as_derivative() {
        let mut pid = PidController::new(gains(0.0, 0.0, 0.5));
        pid.set_target(4.0);
        let out = pid.update(0.0, 2.0);
        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_target_and_accumulators() {
        let mut pid = PidController::new(gains(1.0, 100.0, 1.0));
        pid.set_target(5.0);
        for _ in 0..10 {
            pid.update(1.0, DT);
        }
        pid.reset();
        assert_eq!(*pid.state(), PidState::default());
        assert_eq!(pid.gains().ki, 100.0);
    }

    #[test]
    fn zero_dt_propagates_non_finite() {
        let mut pid = PidController::new(gains(1.0, 0.0, 1.0));
        pid.set_target(1.0);
        let out = pid.update(0.0, 0.0);
        assert!(out.is_infinite());

        // No error change and zero dt: 0/0.
        let mut pid = PidController::new(gains(0.0, 0.0, 1.0));
        assert!(pid.update(0.0, 0.0).is_nan());
    }

    #[test]
    fn default_gains_match_wheel_loop() {
        let g = PidGains::default();
        assert_eq!((g.kp, g.ki, g.kd), (3.0, 100.0, 0.0));
    }
}
