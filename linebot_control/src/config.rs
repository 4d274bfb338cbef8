//! Vehicle configuration.
//!
//! One TOML file, every section optional. Missing sections and fields take
//! the defaults the vehicle was tuned with.
//!
//! ```toml
//! [shared]
//! service_name = "linebot-01"
//! log_level = "debug"
//!
//! [hal]
//! driver = "simulation"
//!
//! [line]
//! algorithm = "maximum_likelihood"
//!
//! [drive]
//! speed = 12.0
//!
//! [workers.control]
//! poll = "spin"
//! cpu_core = 3
//! ```

use crate::control::pid::PidGains;
use crate::estimate::line::LineAlgorithm;
use crate::estimate::marker::{DEFAULT_SIDE_OFFSET, DEFAULT_THRESHOLD, MarkerTrigger};
use crate::scheduler::PollPolicy;
use linebot_common::config::{ConfigError, ConfigLoader, SharedConfig};
use linebot_common::consts::DEFAULT_CALIBRATION_FILE;
use linebot_common::hal::config::HalConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// ─── Workers ────────────────────────────────────────────────────────

/// Pause between scheduler ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollKind {
    #[default]
    Spin,
    Yield,
    Sleep,
}

/// `[workers.<name>]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub poll: PollKind,
    /// Sleep between ticks when `poll = "sleep"`.
    pub sleep_us: u64,
    /// CPU to pin the worker thread to (`rt` feature only).
    pub cpu_core: Option<usize>,
    /// SCHED_FIFO priority (`rt` feature only).
    pub rt_priority: Option<i32>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll: PollKind::Spin,
            sleep_us: 10_000,
            cpu_core: None,
            rt_priority: None,
        }
    }
}

impl WorkerConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        match self.poll {
            PollKind::Spin => PollPolicy::Spin,
            PollKind::Yield => PollPolicy::Yield,
            PollKind::Sleep => PollPolicy::Sleep(Duration::from_micros(self.sleep_us)),
        }
    }

    fn sleeping(sleep_us: u64) -> Self {
        Self {
            poll: PollKind::Sleep,
            sleep_us,
            ..Self::default()
        }
    }

    fn pinned(cpu: usize) -> Self {
        Self {
            cpu_core: Some(cpu),
            ..Self::default()
        }
    }
}

/// `[workers]` section: the three fixed worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Housekeeping (telemetry).
    pub timer: WorkerConfig,
    /// Encoder polling.
    pub encoder: WorkerConfig,
    /// Sensors, calibration, line estimate, battery, drive.
    pub control: WorkerConfig,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            timer: WorkerConfig::sleeping(10_000),
            encoder: WorkerConfig::pinned(2),
            control: WorkerConfig::pinned(3),
        }
    }
}

// ─── Algorithms ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub algorithm: LineAlgorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub threshold: f64,
    pub side_offset: f64,
    pub trigger: MarkerTrigger,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            side_offset: DEFAULT_SIDE_OFFSET,
            // The line under the centre sensors is always dark while
            // driving; only side hits delimit a marker.
            trigger: MarkerTrigger::Side,
        }
    }
}

// ─── Services ───────────────────────────────────────────────────────

/// `[drive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Cruise wheel speed [rev/s].
    pub speed: f64,
    /// Differential steering per unit of line position.
    pub curvature: f64,
    /// Speed ramp while cruising [rev/s²].
    pub accel: f64,
    /// Speed ramp when stopping at the finish [rev/s²].
    pub stop_accel: f64,
    /// Number of `Both` markers after which the vehicle stops (0 = never).
    pub stop_after_both: u32,
    /// Motor update interval [µs].
    pub gate_us: u64,
    /// Wheel speed PID gains.
    pub pid: PidGains,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            speed: 15.0,
            curvature: 1.5,
            accel: 20.0,
            stop_accel: 40.0,
            stop_after_both: 2,
            gate_us: 1_000,
            pid: PidGains::default(),
        }
    }
}

/// `[vsense]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VsenseConfig {
    pub interval_ms: u64,
    /// IIR weight of each new reading.
    pub alpha: f64,
}

impl Default for VsenseConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            alpha: 0.01,
        }
    }
}

/// `[encoder]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub gate_us: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { gate_us: 1 }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { interval_ms: 1_000 }
    }
}

/// `[calibration]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub path: PathBuf,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CALIBRATION_FILE),
        }
    }
}

// ─── Root ───────────────────────────────────────────────────────────

/// Complete vehicle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub shared: SharedConfig,
    pub hal: HalConfig,
    pub calibration: CalibrationConfig,
    pub workers: WorkersConfig,
    pub line: LineConfig,
    pub marker: MarkerConfig,
    pub drive: DriveConfig,
    pub vsense: VsenseConfig,
    pub encoder: EncoderConfig,
    pub telemetry: TelemetryConfig,
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn check_finite(name: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got {v}")))
    }
}

impl ControlConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => {
                info!("Loading config from {}", p.display());
                Self::load(p)?
            }
            None => {
                info!("No config file given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.hal
            .validate()
            .map_err(|e| invalid(format!("hal: {e}")))?;

        if self.calibration.path.as_os_str().is_empty() {
            return Err(invalid("calibration.path cannot be empty".to_string()));
        }

        for (name, w) in [
            ("timer", &self.workers.timer),
            ("encoder", &self.workers.encoder),
            ("control", &self.workers.control),
        ] {
            if w.poll == PollKind::Sleep && w.sleep_us == 0 {
                return Err(invalid(format!(
                    "workers.{name}: sleep_us must be greater than 0"
                )));
            }
            if let Some(p) = w.rt_priority {
                if !(1..=99).contains(&p) {
                    return Err(invalid(format!(
                        "workers.{name}: rt_priority {p} outside 1..=99"
                    )));
                }
            }
        }

        let m = &self.marker;
        if !(m.threshold > 0.0 && m.threshold < 1.0) {
            return Err(invalid(format!(
                "marker.threshold {} outside (0, 1)",
                m.threshold
            )));
        }
        if !(0.0..=2.0).contains(&m.side_offset) {
            return Err(invalid(format!(
                "marker.side_offset {} outside [0, 2]",
                m.side_offset
            )));
        }

        let d = &self.drive;
        check_finite("drive.curvature", d.curvature)?;
        check_finite("drive.pid.kp", d.pid.kp)?;
        check_finite("drive.pid.ki", d.pid.ki)?;
        check_finite("drive.pid.kd", d.pid.kd)?;
        if !(d.speed.is_finite() && d.speed >= 0.0) {
            return Err(invalid(format!("drive.speed {} must be >= 0", d.speed)));
        }
        if !(d.accel.is_finite() && d.accel > 0.0) || !(d.stop_accel.is_finite() && d.stop_accel > 0.0)
        {
            return Err(invalid("drive.accel and drive.stop_accel must be > 0".to_string()));
        }
        if d.gate_us == 0 {
            return Err(invalid("drive.gate_us must be greater than 0".to_string()));
        }

        if !(self.vsense.alpha > 0.0 && self.vsense.alpha <= 1.0) {
            return Err(invalid(format!(
                "vsense.alpha {} outside (0, 1]",
                self.vsense.alpha
            )));
        }
        if self.vsense.interval_ms == 0 || self.telemetry.interval_ms == 0 {
            return Err(invalid(
                "vsense.interval_ms and telemetry.interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
