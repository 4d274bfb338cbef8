//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `HalDriver` trait by handing out
//! ports that all point at one [`SimulatedVehicle`].

use super::vehicle::SimulatedVehicle;
use linebot_common::hal::clock::MonotonicClock;
use linebot_common::hal::config::HalConfig;
use linebot_common::hal::driver::{HalDriver, HalError, Ports};
use linebot_common::hal::ports::{Clock, MotorPort};
use std::sync::Arc;
use tracing::{info, warn};

/// Simulation driver implementing the HalDriver trait.
pub struct SimulationDriver {
    name: &'static str,
    version: &'static str,
    clock: Option<Arc<dyn Clock>>,
    vehicle: Option<Arc<SimulatedVehicle>>,
}

impl SimulationDriver {
    /// Create a driver running on wall-clock time.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            clock: None,
            vehicle: None,
        }
    }

    /// Create a driver running on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new()
        }
    }

    /// The simulated vehicle, once initialized.
    pub fn vehicle(&self) -> Option<&Arc<SimulatedVehicle>> {
        self.vehicle.as_ref()
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HalDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &HalConfig) -> Result<Ports, HalError> {
        if self.vehicle.is_some() {
            return Err(HalError::InitFailed(
                "simulation driver already initialized".to_string(),
            ));
        }
        config.validate()?;

        let clock = self
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let vehicle = Arc::new(SimulatedVehicle::new(config, clock));

        info!(
            "Simulation driver initialized: offset={:.2}, battery={:.1}V, counts/rev={}",
            config.initial_offset, config.battery_voltage, config.counts_per_rev
        );

        self.vehicle = Some(vehicle.clone());
        Ok(Ports {
            clock: vehicle.clone(),
            motor: vehicle.clone(),
            encoder: vehicle.clone(),
            sensor: vehicle.clone(),
            voltage: vehicle,
        })
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        let Some(vehicle) = self.vehicle.take() else {
            warn!("Simulation driver shutdown before init");
            return Ok(());
        };
        vehicle.set_velocity(0.0, 0.0);
        vehicle.enable(false);
        info!(
            "Simulation driver shut down after {:.3} m",
            vehicle.distance()
        );
        Ok(())
    }
}
