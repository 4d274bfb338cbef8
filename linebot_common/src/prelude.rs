//! Prelude module for common re-exports.
//!
//! ```rust
//! use linebot_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Modes ──────────────────────────────────────────────────────────
pub use crate::mode::Mode;

// ─── Sensor Geometry ────────────────────────────────────────────────
pub use crate::consts::{MOTOR_LIMIT, NUM_SENSORS, sensor_position};

// ─── Calibration ────────────────────────────────────────────────────
pub use crate::calibration::{Calibration, CalibrationError};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::clock::{ManualClock, MonotonicClock};
pub use crate::hal::config::HalConfig;
pub use crate::hal::driver::{DriverFactory, HalDriver, HalError, Ports};
pub use crate::hal::ports::{Clock, EncoderPort, MotorPort, QuadratureSample, SensorPort, VoltagePort};

// ─── Timing ─────────────────────────────────────────────────────────
pub use crate::timing::IntervalGate;
