//! HAL driver trait and error types.
//!
//! This module defines:
//! - `HalDriver` trait - Interface for pluggable HAL drivers
//! - `Ports` - The port handles a driver hands to the control stack
//! - `HalError` enum - Error types for HAL operations
//! - `DriverFactory` type alias - Factory function type

use crate::hal::config::HalConfig;
use crate::hal::ports::{Clock, EncoderPort, MotorPort, SensorPort, VoltagePort};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Two drivers registered under one name
    #[error("Driver registered twice: {0}")]
    DuplicateDriver(&'static str),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn HalDriver>;

/// Port handles produced by an initialized driver.
///
/// Cloning is cheap; every worker gets its own clone.
#[derive(Clone)]
pub struct Ports {
    pub clock: Arc<dyn Clock>,
    pub motor: Arc<dyn MotorPort>,
    pub encoder: Arc<dyn EncoderPort>,
    pub sensor: Arc<dyn SensorPort>,
    pub voltage: Arc<dyn VoltagePort>,
}

impl fmt::Debug for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ports")
            .field("sensor_channels", &self.sensor.channel_count())
            .finish_non_exhaustive()
    }
}

/// Trait defining the interface for HAL drivers.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before any worker starts; returns the ports
/// 2. Ports are used concurrently by the workers
/// 3. `shutdown()` - Called after every worker has stopped
pub trait HalDriver: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Bring up the hardware (or model) and hand out its ports.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the hardware is unavailable.
    fn init(&mut self, config: &HalConfig) -> Result<Ports, HalError>;

    /// Release the hardware. Motors must be left disabled.
    fn shutdown(&mut self) -> Result<(), HalError>;
}
