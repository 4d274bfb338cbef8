//! HAL driver implementations.
//!
//! - [`simulation`] - Software vehicle model for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `HalDriver` trait from `linebot_common::hal::driver`
//! 3. Register the factory in [`register_all_drivers`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;
use linebot_common::hal::driver::HalError;

/// Register every built-in driver.
pub fn register_all_drivers(registry: &mut DriverRegistry) -> Result<(), HalError> {
    registry.register(
        "simulation",
        "software vehicle on a straight track with markers",
        simulation::create_driver,
    )
}
