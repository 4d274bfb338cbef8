//! Port traits consumed by the control services.
//!
//! Every port is shared between worker threads behind an `Arc`, so methods
//! take `&self` and implementations use interior mutability. Port calls are
//! infallible: a hardware fault surfaces as an implausible reading, not as
//! an error the control loop has to branch on.

use crate::consts::NUM_SENSORS;

/// Monotonic nanosecond clock.
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin.
    fn now_ns(&self) -> u64;

    /// Nanoseconds elapsed since `from` (a previous `now_ns()` value).
    fn elapsed_ns(&self, from: u64) -> u64 {
        self.now_ns().saturating_sub(from)
    }
}

/// Differential drive motor pair.
pub trait MotorPort: Send + Sync {
    /// Set duty for both wheels. Callers clip to `[-MOTOR_LIMIT, MOTOR_LIMIT]`.
    fn set_velocity(&self, left: f64, right: f64);

    /// Enable or disable the motor driver stage.
    fn enable(&self, on: bool);
}

/// Raw A/B channel levels of both wheel encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuadratureSample {
    pub left_a: bool,
    pub left_b: bool,
    pub right_a: bool,
    pub right_b: bool,
}

impl QuadratureSample {
    /// Left wheel as a two-bit value `(A << 1) | B`.
    #[inline]
    pub fn left(&self) -> u8 {
        ((self.left_a as u8) << 1) | self.left_b as u8
    }

    /// Right wheel as a two-bit value `(A << 1) | B`.
    #[inline]
    pub fn right(&self) -> u8 {
        ((self.right_a as u8) << 1) | self.right_b as u8
    }
}

impl From<(bool, bool, bool, bool)> for QuadratureSample {
    fn from((left_a, left_b, right_a, right_b): (bool, bool, bool, bool)) -> Self {
        Self {
            left_a,
            left_b,
            right_a,
            right_b,
        }
    }
}

/// Wheel encoder inputs.
pub trait EncoderPort: Send + Sync {
    /// Sample the four encoder lines (L.A, L.B, R.A, R.B).
    fn sample(&self) -> QuadratureSample;
}

/// Reflectance sensor array.
pub trait SensorPort: Send + Sync {
    /// Number of channels on the array.
    fn channel_count(&self) -> usize {
        NUM_SENSORS
    }

    /// Raw ADC value of channel `index`.
    fn read_channel(&self, index: usize) -> u16;
}

/// Battery voltage sense.
pub trait VoltagePort: Send + Sync {
    /// Instantaneous battery voltage in volts.
    fn read(&self) -> f64;
}
