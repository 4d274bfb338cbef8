//! # Linebot HAL Library
//!
//! Pluggable hardware drivers for the linebot vehicle. Drivers implement the
//! `HalDriver` trait from `linebot_common::hal::driver` and hand out the
//! port handles the control services run against.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - HAL driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐   create_driver(name)   ┌──────────────────┐
//! │   DriverRegistry    │ ──────────────────────► │  HalDriver       │
//! └─────────────────────┘                         │  (trait object)  │
//!                                                 └────────┬─────────┘
//!                                                          │ init()
//!                                                          ▼
//!                                   Ports { clock, motor, encoder, sensor, voltage }
//! ```

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::register_all_drivers;
