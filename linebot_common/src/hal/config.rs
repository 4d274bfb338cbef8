//! HAL configuration.

use crate::consts::COUNTS_PER_REV;
use crate::hal::driver::HalError;
use serde::{Deserialize, Serialize};

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_battery_voltage() -> f64 {
    8.0
}

fn default_counts_per_rev() -> u32 {
    COUNTS_PER_REV
}

fn default_initial_offset() -> f64 {
    0.1
}

/// `[hal]` section of the vehicle configuration.
///
/// Fields other than `driver` parameterize the simulation model and are
/// ignored by hardware drivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// Registered driver name.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Nominal battery voltage in volts.
    #[serde(default = "default_battery_voltage")]
    pub battery_voltage: f64,

    /// Encoder counts per wheel revolution.
    #[serde(default = "default_counts_per_rev")]
    pub counts_per_rev: u32,

    /// Starting lateral offset from the line, in sensor-array units
    /// (`-1.0` = under the leftmost sensor).
    #[serde(default = "default_initial_offset")]
    pub initial_offset: f64,

    /// Starting heading relative to the line, in radians.
    pub initial_heading: f64,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            battery_voltage: default_battery_voltage(),
            counts_per_rev: default_counts_per_rev(),
            initial_offset: default_initial_offset(),
            initial_heading: 0.0,
        }
    }
}

impl HalConfig {
    /// Validate the HAL configuration.
    ///
    /// # Validation Rules
    /// 1. `driver` is not empty
    /// 2. `battery_voltage` is finite and positive
    /// 3. `counts_per_rev` > 0
    /// 4. `initial_offset` within `[-1, 1]`
    pub fn validate(&self) -> Result<(), HalError> {
        if self.driver.is_empty() {
            return Err(HalError::ConfigError("driver cannot be empty".to_string()));
        }
        if !(self.battery_voltage.is_finite() && self.battery_voltage > 0.0) {
            return Err(HalError::ConfigError(format!(
                "battery_voltage must be positive, got {}",
                self.battery_voltage
            )));
        }
        if self.counts_per_rev == 0 {
            return Err(HalError::ConfigError(
                "counts_per_rev must be greater than 0".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.initial_offset) {
            return Err(HalError::ConfigError(format!(
                "initial_offset {} outside [-1, 1]",
                self.initial_offset
            )));
        }
        Ok(())
    }
}
