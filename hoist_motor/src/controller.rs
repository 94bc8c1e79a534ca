//! Per-axis motion state machine.
//!
//! Rules evaluated once per tick, in order:
//!
//! 0. A command read from the CommandLink replaces the current one
//!    (discarded while resetting).
//! 1. Pending Stop: aborts a reset (`MotionCommand::None`) or forces
//!    `MotionCommand::Stop`; the axis is `Stopped` either way.
//! 2. Pending Reset: `Resetting`, whatever the current command.
//! 3. `Running`: apply the command, clamping at the envelope.
//! 4. `Resetting`: one step toward `lower`, `Stopped` on arrival.
//! 5. Estimate = position + uniform noise.

use hoist_common::config::AxisConfig;
use hoist_common::consts::LIMIT_TOLERANCE;
use hoist_common::motion::{Axis, AxisLimits, ControllerState, MotionCommand};
use hoist_common::signals::{PendingSignals, SignalKind};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use tracing::debug;

/// Snapshot produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// True position after the tick.
    pub position: f64,
    /// Noisy estimate published this tick.
    pub estimated: f64,
    /// State after the tick.
    pub state: ControllerState,
    /// Command after the tick.
    pub command: MotionCommand,
}

/// Motor controller of one axis.
///
/// Owns the axis position, the live command and the state. Nothing else
/// mutates them.
#[derive(Debug, Clone)]
pub struct AxisMotorController {
    axis: Axis,
    limits: AxisLimits,
    step: f64,
    noise: Uniform<f64>,
    position: f64,
    estimated: f64,
    command: MotionCommand,
    state: ControllerState,
    pending: PendingSignals,
}

impl AxisMotorController {
    /// New controller resting at the lower bound, `Stopped`.
    pub fn new(axis: Axis, config: &AxisConfig) -> Self {
        let limits = config.limits();
        Self {
            axis,
            limits,
            step: config.step,
            noise: Uniform::new_inclusive(-config.noise_amplitude, config.noise_amplitude),
            position: limits.lower,
            estimated: limits.lower,
            command: MotionCommand::None,
            state: ControllerState::Stopped,
            pending: PendingSignals::empty(),
        }
    }

    /// Start from `position`, clamped into the envelope.
    pub fn starting_at(mut self, position: f64) -> Self {
        self.position = position.clamp(self.limits.lower, self.limits.upper);
        self.estimated = self.position;
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn limits(&self) -> AxisLimits {
        self.limits
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn estimated(&self) -> f64 {
        self.estimated
    }

    #[inline]
    pub fn command(&self) -> MotionCommand {
        self.command
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Record a preemptive signal. Resolved at the next tick.
    pub fn on_signal(&mut self, kind: SignalKind) {
        match kind {
            SignalKind::Stop | SignalKind::Reset => self.pending |= kind.flag(),
            SignalKind::Resize => {}
        }
    }

    /// Advance one tick.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        link_command: Option<MotionCommand>,
        rng: &mut R,
    ) -> TickReport {
        if let Some(command) = link_command {
            self.apply_link_command(command);
        }

        let pending = std::mem::take(&mut self.pending);
        if pending.contains(PendingSignals::STOP) {
            self.resolve_stop();
        }
        if pending.contains(PendingSignals::RESET) {
            self.enter(ControllerState::Resetting);
        }

        match self.state {
            ControllerState::Running => self.apply_motion(),
            ControllerState::Resetting => self.step_reset(),
            ControllerState::Stopped => {}
        }

        self.estimated = self.position + self.noise.sample(rng);

        TickReport {
            position: self.position,
            estimated: self.estimated,
            state: self.state,
            command: self.command,
        }
    }

    fn apply_link_command(&mut self, command: MotionCommand) {
        if self.state == ControllerState::Resetting {
            debug!("axis {}: {command:?} discarded while resetting", self.axis);
            return;
        }
        self.command = command;
        if command.is_motion() {
            self.enter(ControllerState::Running);
        }
    }

    fn resolve_stop(&mut self) {
        if self.state == ControllerState::Resetting {
            debug!("axis {}: reset aborted at {:.4}", self.axis, self.position);
            self.command = MotionCommand::None;
        } else {
            self.command = MotionCommand::Stop;
        }
        self.enter(ControllerState::Stopped);
    }

    fn apply_motion(&mut self) {
        let AxisLimits { lower, upper } = self.limits;
        match self.command {
            MotionCommand::Increase => {
                if self.position + self.step > upper + LIMIT_TOLERANCE {
                    debug!("axis {}: upper limit {upper} reached", self.axis);
                    self.position = self.position.min(upper);
                    self.halt();
                } else {
                    self.position = (self.position + self.step).min(upper);
                }
            }
            MotionCommand::Decrease => {
                if self.position - self.step < lower - LIMIT_TOLERANCE {
                    debug!("axis {}: lower limit {lower} reached", self.axis);
                    self.position = self.position.max(lower);
                    self.halt();
                } else {
                    self.position = (self.position - self.step).max(lower);
                }
            }
            MotionCommand::Stop | MotionCommand::None => self.enter(ControllerState::Stopped),
        }
    }

    fn halt(&mut self) {
        self.command = MotionCommand::Stop;
        self.enter(ControllerState::Stopped);
    }

    fn step_reset(&mut self) {
        let lower = self.limits.lower;
        if self.position > lower {
            let next = self.position - self.step;
            self.position = if next <= lower + LIMIT_TOLERANCE {
                lower
            } else {
                next
            };
        }
        if self.position <= lower {
            self.position = lower;
            self.command = MotionCommand::None;
            self.enter(ControllerState::Stopped);
        }
    }

    fn enter(&mut self, next: ControllerState) {
        if self.state != next {
            debug!("axis {}: {:?} -> {next:?}", self.axis, self.state);
            self.state = next;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
