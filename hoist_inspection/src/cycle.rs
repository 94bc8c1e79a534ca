//! Fixed-period console loop.
//!
//! ## Cycle Body
//! 1. Drain the signal latch; a pending resize re-initializes the view.
//! 2. Drain both PositionLinks into the telemetry cache.
//! 3. Poll one keystroke and dispatch it.
//! 4. Check for reset completion.
//! 5. Redraw the view.
//! 6. Append the cached estimates to the event log.

use hoist_common::config::HoistConfig;
use hoist_common::event_log::EventLog;
use hoist_common::link::{PidReader, PositionReader, ensure_fifo};
use hoist_common::motion::Axis;
use hoist_common::peer::{KillSignaller, PeerDirectory, PeerSignaller};
use hoist_common::signals::{PendingSignals, SignalLatch};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::console::{InspectionConsole, KeyAction};
use crate::error::ConsoleError;
use crate::keyboard::KeySource;
use crate::render::{HoistView, Surface};

/// Pids passed on the command line. The issuer pid arrives later over the
/// PidHandoff channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPeers {
    pub motor_x: i32,
    pub motor_z: i32,
    pub watchdog: i32,
}

impl LaunchPeers {
    pub fn with_issuer(self, issuer: i32) -> PeerDirectory {
        PeerDirectory {
            motor_x: self.motor_x,
            motor_z: self.motor_z,
            watchdog: self.watchdog,
            issuer,
        }
    }
}

/// What one console tick observed and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsoleTick {
    pub est_x: f64,
    pub est_z: f64,
    pub key: Option<(u8, KeyAction)>,
    pub reset_complete: bool,
    pub resized: bool,
}

/// Owns the console state, the display and every channel end.
pub struct ConsoleRunner<'a, S, D, K> {
    console: InspectionConsole<S>,
    view: HoistView,
    surface: D,
    keys: K,
    position_x: PositionReader,
    position_z: PositionReader,
    log: EventLog,
    latch: &'a SignalLatch,
    period: Duration,
    started: Instant,
    ticks: u64,
    overruns: u64,
}

impl<'a, D: Surface, K: KeySource> ConsoleRunner<'a, KillSignaller, D, K> {
    /// Learn the issuer pid, then open the telemetry channels.
    ///
    /// Reading the PidHandoff blocks until the issuer writes its pid.
    pub fn setup(
        config: &HoistConfig,
        peers: LaunchPeers,
        latch: &'a SignalLatch,
        surface: D,
        keys: K,
    ) -> Result<Self, ConsoleError> {
        let handoff = &config.links.issuer_pid;
        ensure_fifo(handoff)?;
        info!("Waiting for issuer pid on {}", handoff.display());
        let issuer = PidReader::open_blocking(handoff)?.recv()?;
        info!("Issuer pid {issuer}");

        let directory = peers.with_issuer(issuer);
        if let Some((peer, pid)) = directory.invalid_peer() {
            return Err(ConsoleError::InvalidPid { peer, pid });
        }

        let position_x = Self::open_positions(config, Axis::X)?;
        let position_z = Self::open_positions(config, Axis::Z)?;

        let log = EventLog::open(&config.log.file).map_err(|source| ConsoleError::EventLog {
            path: config.log.file.clone(),
            source,
        })?;

        let console = InspectionConsole::new(
            KillSignaller::new(directory),
            config.console.reset_epsilon,
        );
        Ok(Self::from_parts(
            console,
            surface,
            keys,
            position_x,
            position_z,
            log,
            latch,
            config.console.tick(),
        ))
    }

    fn open_positions(config: &HoistConfig, axis: Axis) -> Result<PositionReader, ConsoleError> {
        let path = config.links.position(axis);
        ensure_fifo(path)?;
        let reader = PositionReader::open_nonblocking(path)?;
        debug!("Telemetry for axis {axis} on {}", path.display());
        Ok(reader)
    }
}

impl<'a, S: PeerSignaller, D: Surface, K: KeySource> ConsoleRunner<'a, S, D, K> {
    /// Assemble a runner from already-open parts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        console: InspectionConsole<S>,
        surface: D,
        keys: K,
        position_x: PositionReader,
        position_z: PositionReader,
        log: EventLog,
        latch: &'a SignalLatch,
        period: Duration,
    ) -> Self {
        Self {
            console,
            view: HoistView::default(),
            surface,
            keys,
            position_x,
            position_z,
            log,
            latch,
            period,
            started: Instant::now(),
            ticks: 0,
            overruns: 0,
        }
    }

    pub fn console(&self) -> &InspectionConsole<S> {
        &self.console
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn view(&self) -> &HoistView {
        &self.view
    }

    /// Clear the surface and draw the static frame.
    pub fn init_display(&mut self) -> Result<(), ConsoleError> {
        self.view
            .init(&mut self.surface)
            .map_err(ConsoleError::Display)
    }

    /// Tick until `running` is cleared.
    pub fn run(&mut self, running: Arc<AtomicBool>) -> Result<(), ConsoleError> {
        self.note("inspection: Inspection console started.");
        self.init_display()?;
        self.started = Instant::now();

        while running.load(Ordering::SeqCst) {
            let started = Instant::now();

            self.cycle_body()?;

            let elapsed = started.elapsed();
            self.ticks += 1;
            match self.period.checked_sub(elapsed) {
                Some(remaining) => std::thread::sleep(remaining),
                None => self.overruns += 1,
            }
        }

        self.note("inspection: Inspection console ended.");
        info!("console: {} ticks, {} overruns", self.ticks, self.overruns);
        Ok(())
    }

    /// One tick without the trailing sleep.
    pub fn cycle_body(&mut self) -> Result<ConsoleTick, ConsoleError> {
        let pending = self.latch.drain();
        let resized = pending.contains(PendingSignals::RESIZE);
        if resized {
            debug!("Display resized, redrawing frame");
            self.init_display()?;
        }

        if let Some(sample) = self.position_x.try_read()? {
            self.console.ingest(Axis::X, sample);
        }
        if let Some(sample) = self.position_z.try_read()? {
            self.console.ingest(Axis::Z, sample);
        }

        let key = match self.keys.try_key().map_err(ConsoleError::Keyboard)? {
            Some(key) => {
                let action = self.console.handle_key(key)?;
                self.note(&format!("inspection: Input received = {}", key as char));
                Some((key, action))
            }
            None => None,
        };

        let reset_complete = self.console.check_reset_complete()?;

        let (est_x, est_z) = self.console.estimates();
        let elapsed = self.started.elapsed().as_secs();
        self.view
            .draw(&mut self.surface, est_x, est_z, elapsed)
            .map_err(ConsoleError::Display)?;

        self.note(&format!(
            "inspection: est_pos_x = {est_x:.6}, est_pos_z = {est_z:.6}"
        ));

        Ok(ConsoleTick {
            est_x,
            est_z,
            key,
            reset_complete,
            resized,
        })
    }

    fn note(&mut self, message: &str) {
        if let Err(e) = self.log.record(message) {
            warn!("event log {} write failed: {e}", self.log.path().display());
        }
    }
}
