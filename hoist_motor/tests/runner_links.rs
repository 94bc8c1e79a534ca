//! # Motor Runner Tests
//!
//! Drives `MotorRunner::cycle_body` over real FIFOs in a temp directory,
//! playing the issuer and console ends from the test.

use hoist_common::config::HoistConfig;
use hoist_common::link::{CommandWriter, PositionReader, ensure_fifo};
use hoist_common::motion::{Axis, ControllerState, MotionCommand};
use hoist_common::signals::{SignalKind, SignalLatch};
use hoist_motor::cycle::MotorRunner;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> HoistConfig {
    let mut config = HoistConfig::default();
    config.links.command_z = dir.path().join("cmd_z");
    config.links.position_z = dir.path().join("pos_z");
    config.log.file = dir.path().join("Log.txt");
    config
}

#[test]
fn commands_signals_and_telemetry_flow_through_runner() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_in(&dir);

    // Console end must exist before the runner opens the PositionLink.
    ensure_fifo(&config.links.position_z).expect("position fifo");
    let mut telemetry =
        PositionReader::open_nonblocking(&config.links.position_z).expect("console end");

    let latch = SignalLatch::new();
    let mut runner = MotorRunner::setup(Axis::Z, &config, &latch)
        .expect("setup")
        .with_rng(StdRng::seed_from_u64(9));
    let mut issuer = CommandWriter::open(&config.links.command_z).expect("issuer end");

    // Idle tick: nothing commanded yet.
    let idle = runner.cycle_body().expect("idle tick");
    assert_eq!(idle.state, ControllerState::Stopped);
    assert_eq!(idle.position, 0.0);

    // Motion command.
    assert!(issuer.try_send(&MotionCommand::Increase.code()).expect("send"));
    let moving = runner.cycle_body().expect("moving tick");
    assert_eq!(moving.state, ControllerState::Running);
    assert!((moving.position - 0.01).abs() < 1e-9);

    let sample = telemetry.try_read().expect("read").expect("sample ready");
    assert!((f64::from(sample) - 0.01).abs() <= 0.0051, "sample {sample}");

    // Stop signal preempts the running command.
    latch.raise(SignalKind::Stop);
    let stopped = runner.cycle_body().expect("stop tick");
    assert_eq!(stopped.state, ControllerState::Stopped);
    assert_eq!(stopped.command, MotionCommand::Stop);
    assert_eq!(stopped.position, moving.position);

    // Unknown wire codes are ignored.
    assert!(issuer.try_send(&3).expect("send"));
    let ignored = runner.cycle_body().expect("ignored tick");
    assert_eq!(ignored.state, ControllerState::Stopped);
    assert_eq!(ignored.command, MotionCommand::Stop);

    assert_eq!(runner.stats().dropped_samples, 0);

    let log = std::fs::read_to_string(&config.log.file).expect("log file");
    assert!(log.contains("motor_z: position = 0.010000"), "log:\n{log}");
}

#[test]
fn reset_signal_returns_axis_to_zero() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_in(&dir);
    ensure_fifo(&config.links.position_z).expect("position fifo");
    let mut telemetry =
        PositionReader::open_nonblocking(&config.links.position_z).expect("console end");

    let latch = SignalLatch::new();
    let mut runner = MotorRunner::setup(Axis::Z, &config, &latch)
        .expect("setup")
        .with_rng(StdRng::seed_from_u64(10));
    let mut issuer = CommandWriter::open(&config.links.command_z).expect("issuer end");

    issuer.try_send(&MotionCommand::Increase.code()).expect("send");
    for _ in 0..5 {
        runner.cycle_body().expect("tick");
    }
    assert!((runner.controller().position() - 0.05).abs() < 1e-9);

    latch.raise(SignalKind::Reset);
    let mut ticks = 0;
    while runner.cycle_body().expect("reset tick").state != ControllerState::Stopped {
        ticks += 1;
        assert!(ticks < 10, "reset did not finish");
    }
    assert_eq!(runner.controller().position(), 0.0);
    assert_eq!(runner.controller().command(), MotionCommand::None);

    let last = telemetry.try_read().expect("read").expect("sample ready");
    assert!(f64::from(last).abs() <= 0.0051);
}
