//! Vehicle services.
//!
//! Each service implements [`Service`](crate::scheduler::Service) and talks
//! to the rest of the vehicle only through [`VehicleState`](crate::state::VehicleState)
//! and the HAL ports it was built with.
//!
//! | Service | Mask | Worker |
//! |---|---|---|
//! | [`TelemetryService`] | all | timer |
//! | [`EncoderService`] | all | encoder |
//! | [`SensorService`] | all | control |
//! | [`CalibrationService`] (low) | calibrate_low | control |
//! | [`CalibrationService`] (high) | calibrate_high | control |
//! | [`LineService`] | all | control |
//! | [`VoltageService`] | all | control |
//! | [`DriveService`] | drive | control |

mod calibrate;
mod drive;
mod encoder;
mod line;
mod sensor;
mod telemetry;
mod vsense;

pub use calibrate::{Bound, CalibrationService};
pub use drive::DriveService;
pub use encoder::EncoderService;
pub use line::LineService;
pub use sensor::{SensorService, normalize};
pub use telemetry::TelemetryService;
pub use vsense::VoltageService;
