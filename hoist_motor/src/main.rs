//! # Hoist Motor Controller
//!
//! Simulates one hoist axis. Reads motion commands from the axis
//! CommandLink, reacts to Stop (`SIGUSR1`) and Reset (`SIGUSR2`), and
//! streams estimated positions to the inspection console.
//!
//! # Usage
//!
//! ```bash
//! hoist_motor z
//! hoist_motor x --config hoist.toml -v
//! ```

use clap::Parser;
use hoist_common::config::{ConfigError, HoistConfig, LogLevel};
use hoist_common::motion::Axis;
use hoist_common::signals::{SignalKind, install_handlers};
use hoist_motor::cycle::MotorRunner;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Hoist motor controller, one process per axis
#[derive(Parser, Debug)]
#[command(name = "hoist_motor")]
#[command(version)]
#[command(about = "Per-axis hoist motor controller")]
struct Args {
    /// Axis driven by this process (x or z).
    axis: Axis,

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
        "Hoist motor controller v{} starting (axis {})",
        env!("CARGO_PKG_VERSION"),
        args.axis
    );

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Hoist motor controller shutdown complete");
}

fn run(
    args: &Args,
    config: Result<HoistConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config?;

    let latch = install_handlers(&[SignalKind::Stop, SignalKind::Reset])?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = MotorRunner::setup(args.axis, &config, latch)?;
    info!("Console connected, entering motor loop");

    runner.run(running)?;
    Ok(())
}

/// Setup tracing subscriber from CLI flags and the configured level.
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
