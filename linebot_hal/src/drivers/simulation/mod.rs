//! Simulation driver module.
//!
//! Software model of the vehicle on a straight track with markers, for
//! development and testing without physical hardware.

mod driver;
mod physics;
mod vehicle;

pub use driver::SimulationDriver;
pub use physics::{MarkerSide, TRACK_MARKERS, VehicleModel};
pub use vehicle::SimulatedVehicle;

use linebot_common::hal::driver::HalDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn HalDriver> {
    Box::new(SimulationDriver::new())
}
