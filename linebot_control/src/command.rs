//! Operator command channel.
//!
//! One command per line:
//!
//! | Command | Effect |
//! |---|---|
//! | `drive` | mode → drive |
//! | `idle` | mode → idle |
//! | `cali_low` | mode → calibrate_low (vehicle over white) |
//! | `cali_high` | mode → calibrate_high (vehicle over the line) |
//! | `cali_save` | mode → idle and store the calibration bounds |
//! | `status` | one JSON line with the mode and vehicle snapshot |
//! | `quit`, `halt` | mode → halt, workers stop |

use crate::error::{CommandError, ControlError};
use crate::scheduler::{GlobalContext, GlobalSnapshot, ModeRequest};
use crate::state::{VehicleSnapshot, VehicleState};
use linebot_common::mode::Mode;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    SetMode(Mode),
    /// Leave calibration and write the bounds to the calibration file.
    SaveCalibration,
    Status,
}

impl FromStr for OperatorCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = match s.trim().to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "drive" => Self::SetMode(Mode::DRIVE),
            "idle" => Self::SetMode(Mode::IDLE),
            "cali_save" => Self::SaveCalibration,
            "cali_low" => Self::SetMode(Mode::CALIBRATE_LOW),
            "cali_high" => Self::SetMode(Mode::CALIBRATE_HIGH),
            "status" => Self::Status,
            "quit" | "halt" => Self::SetMode(Mode::HALT),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}

/// Reply to `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub mode: GlobalSnapshot,
    pub vehicle: VehicleSnapshot,
}

impl StatusReport {
    pub fn capture(global: &GlobalContext, state: &VehicleState) -> Self {
        Self {
            mode: global.snapshot(),
            vehicle: state.snapshot(),
        }
    }
}

fn request_mode(global: &GlobalContext, mode: Mode) {
    match global.set_mode(mode) {
        Ok(ModeRequest::Applied) => {}
        Ok(ModeRequest::Queued) => info!("Mode change to '{mode}' queued behind transition"),
        Ok(ModeRequest::Unchanged) => debug!("Already in '{mode}'"),
        Err(e) => warn!("Mode change refused: {e}"),
    }
}

/// Execute one command. Refused mode changes and failed saves are logged,
/// not returned.
///
/// `cali_save` out of a calibration mode leaves the write to that mode's
/// teardown, which runs with the final bounds. From any other mode the
/// current bounds are written here.
pub fn dispatch<W: Write>(
    cmd: OperatorCommand,
    global: &GlobalContext,
    state: &VehicleState,
    calibration_path: &Path,
    out: &mut W,
) -> io::Result<()> {
    match cmd {
        OperatorCommand::SetMode(mode) => request_mode(global, mode),
        OperatorCommand::SaveCalibration => {
            let calibrating = global
                .current_mode()
                .intersects(Mode::CALIBRATE_LOW | Mode::CALIBRATE_HIGH);
            request_mode(global, Mode::IDLE);
            if !calibrating {
                match state.calibration().save(calibration_path) {
                    Ok(()) => info!("Calibration saved to {}", calibration_path.display()),
                    Err(e) => warn!("Failed to save calibration: {e}"),
                }
            }
        }
        OperatorCommand::Status => {
            serde_json::to_writer(&mut *out, &StatusReport::capture(global, state))?;
            writeln!(out)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// Read commands until EOF or until the scheduler halts.
pub fn command_loop<R: BufRead, W: Write>(
    input: R,
    mut out: W,
    global: &GlobalContext,
    state: &VehicleState,
    calibration_path: &Path,
) -> Result<(), ControlError> {
    for line in input.lines() {
        let line = line?;
        match line.parse::<OperatorCommand>() {
            Ok(cmd) => dispatch(cmd, global, state, calibration_path, &mut out)?,
            Err(CommandError::Empty) => continue,
            Err(e) => warn!("{e}"),
        }
        if global.current_mode() == Mode::HALT {
            return Ok(());
        }
    }
    info!("Operator input closed");
    Ok(())
}
