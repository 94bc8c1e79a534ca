//! # Console Loop Tests
//!
//! Drives `ConsoleRunner::cycle_body` over real PositionLink FIFOs, with the
//! test playing both motor controllers. Keys are scripted, the display is
//! in memory and outgoing signals are recorded instead of delivered.

use hoist_common::prelude::*;
use hoist_inspection::console::{InspectionConsole, KeyAction};
use hoist_inspection::cycle::{ConsoleRunner, LaunchPeers};
use hoist_inspection::error::ConsoleError;
use hoist_inspection::keyboard::ScriptedKeys;
use hoist_inspection::render::MemorySurface;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Default)]
struct Recorder {
    sent: Vec<(Peer, HoistSignal)>,
}

impl PeerSignaller for Recorder {
    fn send(&mut self, peer: Peer, signal: HoistSignal) -> Result<(), SignalError> {
        self.sent.push((peer, signal));
        Ok(())
    }
}

struct Motors {
    x: PositionWriter,
    z: PositionWriter,
}

impl Motors {
    fn publish(&mut self, x: f32, z: f32) {
        assert!(self.x.try_send(&x).expect("send x"));
        assert!(self.z.try_send(&z).expect("send z"));
    }
}

type Runner<'a> = ConsoleRunner<'a, Recorder, MemorySurface, ScriptedKeys>;

fn rig<'a>(dir: &TempDir, latch: &'a SignalLatch, keys: ScriptedKeys) -> (Runner<'a>, Motors) {
    let path_x = dir.path().join("est_pos_x");
    let path_z = dir.path().join("est_pos_z");
    ensure_fifo(&path_x).expect("fifo x");
    ensure_fifo(&path_z).expect("fifo z");

    let reader_x = PositionReader::open_nonblocking(&path_x).expect("reader x");
    let reader_z = PositionReader::open_nonblocking(&path_z).expect("reader z");
    let motors = Motors {
        x: PositionWriter::open(&path_x).expect("writer x"),
        z: PositionWriter::open(&path_z).expect("writer z"),
    };

    let log = EventLog::open(&dir.path().join("Log.txt")).expect("log");
    let console = InspectionConsole::new(Recorder::default(), 0.001);
    let mut runner = ConsoleRunner::from_parts(
        console,
        MemorySurface::new(30, 70),
        keys,
        reader_x,
        reader_z,
        log,
        latch,
        Duration::from_millis(15),
    );
    runner.init_display().expect("init display");
    (runner, motors)
}

fn sent<'r>(runner: &'r Runner<'_>) -> &'r [(Peer, HoistSignal)] {
    &runner.console().signaller().sent
}

#[test]
fn reset_handshake_completes_when_both_axes_reach_zero() {
    let dir = TempDir::new().expect("tempdir");
    let latch = SignalLatch::new();
    let mut keys = ScriptedKeys::new();
    keys.press(b'r');
    let (mut runner, mut motors) = rig(&dir, &latch, keys);

    motors.publish(0.5, 0.3);
    let first = runner.cycle_body().expect("tick 1");
    assert_eq!(first.key, Some((b'r', KeyAction::Reset)));
    assert!(!first.reset_complete);
    assert!(runner.console().reset_armed());
    assert_eq!(
        sent(&runner),
        &[
            (Peer::Watchdog, HoistSignal::LivenessPulse),
            (Peer::Motor(Axis::X), HoistSignal::Reset),
            (Peer::Motor(Axis::Z), HoistSignal::Reset),
            (Peer::Issuer, HoistSignal::ResetStarted),
        ]
    );

    motors.publish(0.0004, 0.0002);
    let second = runner.cycle_body().expect("tick 2");
    assert!(second.reset_complete);
    assert_eq!(
        sent(&runner).last(),
        Some(&(Peer::Issuer, HoistSignal::ResetComplete))
    );

    // No new samples: cached values are redisplayed, nothing resent.
    let third = runner.cycle_body().expect("tick 3");
    assert!(!third.reset_complete);
    assert_eq!((third.est_x, third.est_z), (second.est_x, second.est_z));
    assert_eq!(sent(&runner).len(), 5);

    assert_eq!(runner.surface().char_at(5, 2), Some('V'));
    assert_eq!(
        runner.surface().row_text(26),
        "Estimated position (X, Z) = ( 0.000, 0.000)"
    );

    let log = std::fs::read_to_string(dir.path().join("Log.txt")).expect("log file");
    assert!(log.contains("inspection: Input received = r"), "log:\n{log}");
    assert!(
        log.contains("inspection: est_pos_x = 0.500000, est_pos_z = 0.300000"),
        "log:\n{log}"
    );
}

#[test]
fn stop_key_reaches_issuer_and_motors() {
    let dir = TempDir::new().expect("tempdir");
    let latch = SignalLatch::new();
    let mut keys = ScriptedKeys::new();
    keys.idle(1).press(b's').press(b'x');
    let (mut runner, _motors) = rig(&dir, &latch, keys);

    assert_eq!(runner.cycle_body().expect("idle").key, None);
    assert!(sent(&runner).is_empty());

    let stop = runner.cycle_body().expect("stop");
    assert_eq!(stop.key, Some((b's', KeyAction::Stop)));
    assert_eq!(
        &sent(&runner)[1..],
        &[
            (Peer::Issuer, HoistSignal::Stop),
            (Peer::Motor(Axis::X), HoistSignal::Stop),
            (Peer::Motor(Axis::Z), HoistSignal::Stop),
        ]
    );

    let other = runner.cycle_body().expect("other key");
    assert_eq!(other.key, Some((b'x', KeyAction::Ignored)));
    assert_eq!(
        sent(&runner).last(),
        Some(&(Peer::Watchdog, HoistSignal::LivenessPulse))
    );
}

#[test]
fn newest_sample_wins_within_a_tick() {
    let dir = TempDir::new().expect("tempdir");
    let latch = SignalLatch::new();
    let (mut runner, mut motors) = rig(&dir, &latch, ScriptedKeys::new());

    motors.publish(1.0, 1.0);
    motors.publish(2.0, 3.75);
    let tick = runner.cycle_body().expect("tick");
    assert_eq!((tick.est_x, tick.est_z), (2.0, 3.75));
    // z = 3.75 -> row 11, x = 2.0 -> col 12.
    assert_eq!(runner.view().last_cell(), Some((11, 12)));
}

#[test]
fn resize_redraws_frame_and_keeps_telemetry() {
    let dir = TempDir::new().expect("tempdir");
    let latch = SignalLatch::new();
    let mut keys = ScriptedKeys::new();
    keys.press(b'r');
    let (mut runner, mut motors) = rig(&dir, &latch, keys);

    motors.publish(4.0, 2.5);
    runner.cycle_body().expect("tick");
    assert_eq!(runner.surface().clears(), 1);

    latch.raise(SignalKind::Resize);
    let tick = runner.cycle_body().expect("resize tick");
    assert!(tick.resized);
    assert_eq!(runner.surface().clears(), 2);
    assert_eq!((tick.est_x, tick.est_z), (4.0, 2.5));
    assert!(runner.console().reset_armed());

    assert_eq!(runner.surface().row_text(0), "This is the INSPECTION console.");
    assert_eq!(runner.surface().char_at(9, 22), Some('V'));
    assert_eq!(runner.surface().char_at(5, 22), Some('|'));
}

/// Run `setup` against a handoff on which the issuer announces `issuer`.
fn setup_with_issuer(peers: LaunchPeers, issuer: i32) -> Option<ConsoleError> {
    let dir = TempDir::new().expect("tempdir");
    let mut config = HoistConfig::default();
    config.links.issuer_pid = dir.path().join("issuer_pid");
    config.links.position_x = dir.path().join("est_pos_x");
    config.links.position_z = dir.path().join("est_pos_z");
    config.log.file = dir.path().join("Log.txt");
    ensure_fifo(&config.links.issuer_pid).expect("handoff fifo");

    let handoff = config.links.issuer_pid.clone();
    let issuer_side = thread::spawn(move || {
        let mut writer = CommandWriter::open(&handoff).expect("handoff writer");
        assert!(writer.try_send(&issuer).expect("send pid"));
    });

    let latch = SignalLatch::new();
    let result = ConsoleRunner::setup(
        &config,
        peers,
        &latch,
        MemorySurface::new(30, 70),
        ScriptedKeys::new(),
    );
    issuer_side.join().expect("issuer thread");
    result.err()
}

const LAUNCH: LaunchPeers = LaunchPeers {
    motor_x: 4211,
    motor_z: 4212,
    watchdog: 4200,
};

#[test]
fn setup_rejects_group_issuer_pid() {
    match setup_with_issuer(LAUNCH, 0) {
        Some(ConsoleError::InvalidPid { peer, pid }) => {
            assert_eq!(peer, Peer::Issuer);
            assert_eq!(pid, 0);
        }
        other => panic!("expected InvalidPid, got {other:?}"),
    }

    assert!(matches!(
        setup_with_issuer(LAUNCH, -1),
        Some(ConsoleError::InvalidPid { peer: Peer::Issuer, pid: -1 })
    ));
}

#[test]
fn setup_rejects_group_launch_pid() {
    let peers = LaunchPeers {
        watchdog: 0,
        ..LAUNCH
    };
    assert!(matches!(
        setup_with_issuer(peers, 4300),
        Some(ConsoleError::InvalidPid { peer: Peer::Watchdog, pid: 0 })
    ));
}

#[test]
fn setup_with_valid_pids_opens_channels() {
    assert!(setup_with_issuer(LAUNCH, 4300).is_none());
}
