//! Error types of the control crate.
//!
//! Fatal init errors bubble up to `main` as [`ControlError`]; scheduler and
//! command errors are returned to the caller that asked for the change and
//! never stop a running worker.

use linebot_common::config::ConfigError;
use linebot_common::hal::driver::HalError;
use linebot_common::mode::Mode;
use thiserror::Error;

/// Errors raised by the mode scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Requested value is empty, a combination, or contains unknown bits.
    #[error("'{0}' is not a single operating mode")]
    InvalidMode(Mode),

    /// Worker service list has no room for another registration.
    #[error("worker '{worker}' already holds {capacity} services")]
    ServiceListFull { worker: String, capacity: usize },

    /// The scheduler has halted; no further mode changes are accepted.
    #[error("scheduler halted, refusing change to '{0}'")]
    Halted(Mode),
}

/// Errors parsing an operator command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("empty command")]
    Empty,
}

/// Errors during RT thread setup.
#[derive(Debug, Clone, Error)]
pub enum RtError {
    #[error("RT setup error: {0}")]
    Setup(String),
}

/// Top-level error of the control binary.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hal(#[from] HalError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Rt(#[from] RtError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("worker '{0}' panicked")]
    WorkerPanicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_error_messages() {
        let e = SchedulerError::InvalidMode(Mode::IDLE | Mode::DRIVE);
        assert_eq!(e.to_string(), "'idle|drive' is not a single operating mode");

        let e = SchedulerError::ServiceListFull {
            worker: "control".to_string(),
            capacity: 32,
        };
        assert!(e.to_string().contains("32"));
    }

    #[test]
    fn control_error_wraps_sources() {
        let e: ControlError = ConfigError::FileNotFound("linebot.toml".into()).into();
        assert!(matches!(e, ControlError::Config(_)));
        assert_eq!(e.to_string(), "Configuration file not found: linebot.toml");

        let e: ControlError = HalError::DriverNotFound("can".to_string()).into();
        assert_eq!(e.to_string(), "Driver not found: can");
    }
}
