//! Fixed-period motor tick loop: read → resolve → move → publish.
//!
//! ## Cycle Body
//! 1. Drain the CommandLink (newest code wins).
//! 2. Drain the signal latch into the controller.
//! 3. Tick the state machine.
//! 4. Best-effort write of the estimate to the PositionLink.
//! 5. Append the true position to the event log.
//!
//! ## Pacing
//! The loop sleeps for whatever remains of the tick period after the body.
//! Nothing else in the loop blocks.

use hoist_common::config::HoistConfig;
use hoist_common::event_log::EventLog;
use hoist_common::link::{CommandReader, PositionWriter, ensure_fifo};
use hoist_common::motion::{Axis, MotionCommand};
use hoist_common::signals::SignalLatch;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::controller::{AxisMotorController, TickReport};
use crate::error::MotorError;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total ticks executed.
    pub cycle_count: u64,
    /// Last body duration [µs].
    pub last_cycle_us: u64,
    /// Longest body duration [µs].
    pub max_cycle_us: u64,
    /// Ticks whose body overran the period.
    pub overruns: u64,
    /// Estimates dropped because the PositionLink was full.
    pub dropped_samples: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_us: 0,
            max_cycle_us: 0,
            overruns: 0,
            dropped_samples: 0,
        }
    }

    /// Record a body duration against the tick budget.
    #[inline]
    pub fn record(&mut self, elapsed: Duration, budget: Duration) {
        let us = elapsed.as_micros() as u64;
        self.cycle_count += 1;
        self.last_cycle_us = us;
        if us > self.max_cycle_us {
            self.max_cycle_us = us;
        }
        if elapsed > budget {
            self.overruns += 1;
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Motor Runner ───────────────────────────────────────────────────

/// Owns one axis controller and the channels around it.
pub struct MotorRunner<'a> {
    controller: AxisMotorController,
    commands: CommandReader,
    positions: PositionWriter,
    log: EventLog,
    latch: &'a SignalLatch,
    rng: StdRng,
    period: Duration,
    stats: CycleStats,
}

impl<'a> MotorRunner<'a> {
    /// Create the channels and open them.
    ///
    /// Opening the PositionLink waits until the console has opened its
    /// reading end.
    pub fn setup(
        axis: Axis,
        config: &HoistConfig,
        latch: &'a SignalLatch,
    ) -> Result<Self, MotorError> {
        let command_path = config.links.command(axis);
        let position_path = config.links.position(axis);
        ensure_fifo(command_path)?;
        ensure_fifo(position_path)?;

        let log = EventLog::open(&config.log.file).map_err(|source| MotorError::EventLog {
            path: config.log.file.clone(),
            source,
        })?;

        let commands = CommandReader::open_nonblocking(command_path)?;
        info!("Listening for commands on {}", command_path.display());

        info!("Waiting for console on {}", position_path.display());
        let positions = PositionWriter::open(position_path)?;

        let controller = AxisMotorController::new(axis, config.axis.get(axis));
        Ok(Self::from_parts(
            controller,
            commands,
            positions,
            log,
            latch,
            config.motor.tick(),
        ))
    }

    /// Assemble a runner from already-open parts.
    pub fn from_parts(
        controller: AxisMotorController,
        commands: CommandReader,
        positions: PositionWriter,
        log: EventLog,
        latch: &'a SignalLatch,
        period: Duration,
    ) -> Self {
        Self {
            controller,
            commands,
            positions,
            log,
            latch,
            rng: StdRng::from_entropy(),
            period,
            stats: CycleStats::new(),
        }
    }

    /// Replace the noise source (deterministic runs).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn controller(&self) -> &AxisMotorController {
        &self.controller
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Tick until `running` is cleared.
    pub fn run(&mut self, running: Arc<AtomicBool>) -> Result<(), MotorError> {
        let axis = self.controller.axis();
        self.note(&format!("motor_{axis}: motor controller started."));

        while running.load(Ordering::SeqCst) {
            let started = Instant::now();

            self.cycle_body()?;

            let elapsed = started.elapsed();
            self.stats.record(elapsed, self.period);
            if let Some(remaining) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        self.note(&format!("motor_{axis}: motor controller ended."));
        info!(
            "axis {axis}: {} ticks, max body {}µs, {} overruns, {} dropped samples",
            self.stats.cycle_count,
            self.stats.max_cycle_us,
            self.stats.overruns,
            self.stats.dropped_samples
        );
        Ok(())
    }

    /// One tick without the trailing sleep.
    pub fn cycle_body(&mut self) -> Result<TickReport, MotorError> {
        let axis = self.controller.axis();

        let command = match self.commands.try_read()? {
            Some(code) => match MotionCommand::from_code(code) {
                Some(command) => {
                    debug!("axis {axis}: received {command:?}");
                    Some(command)
                }
                None => {
                    warn!("axis {axis}: ignoring unknown command code {code}");
                    None
                }
            },
            None => None,
        };

        for kind in self.latch.drain().kinds() {
            debug!("axis {axis}: signal {kind:?}");
            self.controller.on_signal(kind);
        }

        let report = self.controller.tick(command, &mut self.rng);

        if !self.positions.try_send(&(report.estimated as f32))? {
            self.stats.dropped_samples += 1;
        }

        self.note(&format!("motor_{axis}: position = {:.6}", report.position));
        Ok(report)
    }

    fn note(&mut self, message: &str) {
        if let Err(e) = self.log.record(message) {
            warn!("event log {} write failed: {e}", self.log.path().display());
        }
    }
}
