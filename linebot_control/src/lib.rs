//! # Linebot Control
//!
//! Firmware core of a line-following vehicle: a cooperative mode scheduler
//! drives a fixed set of worker threads, each dispatching its services
//! according to the global operating mode.
//!
//! ## Layers
//!
//! 1. **Scheduler**: global mode, per-worker phase derivation, epoch barrier
//! 2. **Services**: sensor, calibration, line, battery, encoder, drive, telemetry
//! 3. **Estimators**: line position, track markers, quadrature decoding
//! 4. **Control**: wheel speed PID and filters
//!
//! Services share a lock-free [`state::VehicleState`]; only the mode triple in
//! [`scheduler::GlobalContext`] is behind a mutex.

pub mod command;
pub mod config;
pub mod control;
pub mod error;
pub mod estimate;
pub mod rt;
pub mod runtime;
pub mod scheduler;
pub mod services;
pub mod state;
