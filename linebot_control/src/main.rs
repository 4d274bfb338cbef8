//! # Linebot Control
//!
//! Loads the vehicle configuration, initializes the HAL driver, starts the
//! worker threads and reads operator commands from stdin until halted.

use clap::Parser;
use linebot_common::config::LogLevel;
use linebot_common::mode::Mode;
use linebot_control::command::command_loop;
use linebot_control::config::ControlConfig;
use linebot_control::error::ControlError;
use linebot_control::runtime::Vehicle;
use linebot_hal::{DriverRegistry, register_all_drivers};
use std::io;
use std::path::PathBuf;
use std::process;
use std::thread;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Linebot vehicle control
#[derive(Parser, Debug)]
#[command(name = "linebot_control")]
#[command(version)]
#[command(about = "Mode-scheduled line following vehicle control")]
struct Args {
    /// Vehicle configuration TOML. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HAL driver name (overrides `hal.driver`).
    #[arg(long)]
    driver: Option<String>,

    /// Calibration file (overrides `calibration.path`).
    #[arg(long, value_name = "FILE")]
    calibration: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Print the available HAL drivers and exit.
    #[arg(long)]
    list_drivers: bool,
}

fn main() {
    let args = Args::parse();

    if args.list_drivers {
        let mut registry = DriverRegistry::new();
        if let Err(e) = register_all_drivers(&mut registry) {
            eprintln!("{e}");
            process::exit(1);
        }
        for (name, description) in registry.describe() {
            println!("{name:<12} {description}");
        }
        return;
    }

    let config = match ControlConfig::load_or_default(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn run(args: &Args, mut config: ControlConfig) -> Result<(), ControlError> {
    if let Some(driver) = &args.driver {
        config.hal.driver = driver.clone();
    }
    if let Some(path) = &args.calibration {
        config.calibration.path = path.clone();
    }
    config.validate()?;

    let mut registry = DriverRegistry::new();
    register_all_drivers(&mut registry)?;
    let mut driver = registry.create_driver(&config.hal.driver)?;
    info!("Using driver '{}' v{}", driver.name(), driver.version());
    let ports = driver.init(&config.hal)?;

    let vehicle = Vehicle::build(&config, &ports)?.spawn()?;

    let global = vehicle.global().clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        if let Err(e) = global.set_mode(Mode::HALT) {
            warn!("{e}");
        }
    })?;

    // Detached: a blocking stdin read must not hold up shutdown.
    let global = vehicle.global().clone();
    let state = vehicle.state().clone();
    let calibration_path = config.calibration.path.clone();
    thread::Builder::new()
        .name("linebot-operator".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            if let Err(e) = command_loop(
                stdin.lock(),
                io::stdout(),
                &global,
                &state,
                &calibration_path,
            ) {
                warn!("Operator channel closed: {e}");
            }
        })?;

    info!("Vehicle running; commands: drive, idle, cali_low, cali_high, cali_save, status, quit");

    let reports = vehicle.join();
    driver.shutdown()?;
    for report in reports? {
        info!(
            worker = %report.name,
            ticks = report.stats.tick_count,
            avg_ns = report.stats.avg_tick_ns(),
            max_ns = report.stats.max_tick_ns,
            "Worker summary"
        );
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
