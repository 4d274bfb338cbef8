//! Vehicle assembly.
//!
//! Builds the shared contexts and the three workers with their fixed service
//! layout, then runs each worker on its own named OS thread.
//!
//! ```text
//!   timer    ── telemetry
//!   encoder  ── encoder
//!   control  ── sensor ─ calibrate_low ─ calibrate_high ─ line ─ vsense ─ drive
//! ```
//!
//! Registration order within a worker is dispatch order: the drive loop
//! sees the line position computed from this tick's sensor sample.

use crate::config::{ControlConfig, WorkerConfig};
use crate::error::ControlError;
use crate::estimate::line::LineEstimator;
use crate::rt::{rt_mlockall, rt_setup_worker};
use crate::scheduler::{GlobalContext, LocalContext, WorkerReport};
use crate::services::{
    Bound, CalibrationService, DriveService, EncoderService, LineService, SensorService,
    TelemetryService, VoltageService,
};
use crate::state::VehicleState;
use linebot_common::calibration::Calibration;
use linebot_common::hal::driver::Ports;
use linebot_common::mode::Mode;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

struct Worker {
    local: LocalContext,
    config: WorkerConfig,
}

/// Fully wired vehicle, not yet running.
pub struct Vehicle {
    global: Arc<GlobalContext>,
    state: Arc<VehicleState>,
    workers: Vec<Worker>,
}

impl Vehicle {
    /// Wire every service to `ports` and load the calibration file.
    pub fn build(config: &ControlConfig, ports: &Ports) -> Result<Self, ControlError> {
        let global = Arc::new(GlobalContext::new());
        let state = Arc::new(VehicleState::new());

        if let Some(cal) = Calibration::load_or_uncalibrated(&config.calibration.path) {
            state.apply_calibration(&cal);
        }

        let mut timer = LocalContext::new("timer", global.clone());
        timer.add_service(Box::new(TelemetryService::new(
            state.clone(),
            global.clone(),
            ports.clock.clone(),
            Duration::from_millis(config.telemetry.interval_ms),
        )))?;

        let mut encoder = LocalContext::new("encoder", global.clone());
        encoder.add_service(Box::new(EncoderService::new(
            state.clone(),
            ports.encoder.clone(),
            ports.clock.clone(),
            Duration::from_micros(config.encoder.gate_us),
        )))?;

        let mut control = LocalContext::new("control", global.clone());
        control.add_service(Box::new(SensorService::new(
            state.clone(),
            ports.sensor.clone(),
        )))?;
        for bound in [Bound::Low, Bound::High] {
            control.add_service(Box::new(CalibrationService::new(
                bound,
                state.clone(),
                ports.sensor.clone(),
                config.calibration.path.clone(),
            )))?;
        }
        control.add_service(Box::new(LineService::new(
            state.clone(),
            LineEstimator::new(config.line.algorithm),
        )))?;
        control.add_service(Box::new(VoltageService::new(
            state.clone(),
            ports.voltage.clone(),
            ports.clock.clone(),
            Duration::from_millis(config.vsense.interval_ms),
            config.vsense.alpha,
        )))?;
        control.add_service(Box::new(DriveService::new(
            state.clone(),
            ports.motor.clone(),
            ports.clock.clone(),
            config.drive.clone(),
            &config.marker,
        )))?;

        let w = &config.workers;
        let workers = vec![
            Worker {
                local: timer,
                config: w.timer.clone(),
            },
            Worker {
                local: encoder,
                config: w.encoder.clone(),
            },
            Worker {
                local: control,
                config: w.control.clone(),
            },
        ];

        info!(
            workers = workers.len(),
            line = ?config.line.algorithm,
            calibrated = state.calibrated(),
            "Vehicle assembled"
        );

        Ok(Self {
            global,
            state,
            workers,
        })
    }

    pub fn global(&self) -> &Arc<GlobalContext> {
        &self.global
    }

    pub fn state(&self) -> &Arc<VehicleState> {
        &self.state
    }

    /// Start one thread per worker.
    ///
    /// A worker whose pinning or priority cannot be applied still runs, with
    /// a warning.
    pub fn spawn(self) -> Result<RunningVehicle, ControlError> {
        rt_mlockall()?;

        let mut handles = Vec::with_capacity(self.workers.len());
        for Worker { local, config } in self.workers {
            let name = local.name().to_string();
            let poll = config.poll_policy();
            let thread_name = name.clone();
            let handle = thread::Builder::new()
                .name(format!("linebot-{name}"))
                .spawn(move || {
                    if let Err(e) =
                        rt_setup_worker(&thread_name, config.cpu_core, config.rt_priority)
                    {
                        warn!(worker = %thread_name, "{e}; running without RT settings");
                    }
                    local.run(poll)
                })?;
            handles.push((name, handle));
        }

        Ok(RunningVehicle {
            global: self.global,
            state: self.state,
            handles,
        })
    }
}

/// Vehicle with its workers running.
pub struct RunningVehicle {
    global: Arc<GlobalContext>,
    state: Arc<VehicleState>,
    handles: Vec<(String, JoinHandle<WorkerReport>)>,
}

impl RunningVehicle {
    pub fn global(&self) -> &Arc<GlobalContext> {
        &self.global
    }

    pub fn state(&self) -> &Arc<VehicleState> {
        &self.state
    }

    /// Request `HALT`. Already halted is not an error.
    pub fn halt(&self) {
        if let Err(e) = self.global.set_mode(Mode::HALT) {
            info!("{e}");
        }
    }

    /// Wait for every worker to stop.
    ///
    /// All workers are joined even when one of them panicked; the first
    /// panic is returned.
    pub fn join(self) -> Result<Vec<WorkerReport>, ControlError> {
        let mut reports = Vec::with_capacity(self.handles.len());
        let mut first_panic = None;
        for (name, handle) in self.handles {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => {
                    warn!(worker = %name, "Worker panicked");
                    first_panic.get_or_insert(ControlError::WorkerPanicked(name));
                }
            }
        }
        match first_panic {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}
