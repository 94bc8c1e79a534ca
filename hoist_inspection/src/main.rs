//! # Hoist Inspection Console
//!
//! Shows where the hoist is and lets the operator stop (`s`) or reset
//! (`r`) both axes. Learns the command issuer's pid over the PidHandoff
//! channel; the motor and watchdog pids come from the command line.
//!
//! # Usage
//!
//! ```bash
//! hoist_inspection 4211 4212 4200
//! hoist_inspection 4211 4212 4200 --config hoist.toml -v 2>console.err
//! ```

use clap::Parser;
use hoist_common::config::{ConfigError, HoistConfig, LogLevel};
use hoist_common::signals::{SignalKind, install_handlers};
use hoist_inspection::cycle::{ConsoleRunner, LaunchPeers};
use hoist_inspection::error::ConsoleError;
use hoist_inspection::keyboard::TerminalKeyboard;
use hoist_inspection::render::AnsiTerminal;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Hoist inspection console
#[derive(Parser, Debug)]
#[command(name = "hoist_inspection")]
#[command(version)]
#[command(about = "Hoist inspection console")]
struct Args {
    /// Pid of the X axis motor controller.
    #[arg(value_parser = clap::value_parser!(i32).range(1..))]
    pid_x: i32,

    /// Pid of the Z axis motor controller.
    #[arg(value_parser = clap::value_parser!(i32).range(1..))]
    pid_z: i32,

    /// Pid of the watchdog.
    #[arg(value_parser = clap::value_parser!(i32).range(1..))]
    pid_wd: i32,

    /// Optional TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = HoistConfig::load_or_default(args.config.as_deref());
    setup_tracing(&args, config.as_ref().map(|c| c.shared.log_level).unwrap_or_default());

    info!(
        "Hoist inspection console v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Hoist inspection console shutdown complete");
}

fn run(
    args: &Args,
    config: Result<HoistConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config?;

    let latch = install_handlers(&[SignalKind::Resize])?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let peers = LaunchPeers {
        motor_x: args.pid_x,
        motor_z: args.pid_z,
        watchdog: args.pid_wd,
    };
    let keys = TerminalKeyboard::stdin().map_err(ConsoleError::Keyboard)?;
    let mut runner =
        ConsoleRunner::setup(&config, peers, latch, AnsiTerminal::stdout(), keys)?;
    info!("Telemetry channels open, entering console loop");

    runner.run(running)?;
    Ok(())
}

/// Setup tracing subscriber from CLI flags and the configured level.
///
/// Diagnostics go to stderr so they never land on the drawn view.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        "debug"
    } else {
        configured.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
