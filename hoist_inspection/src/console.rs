//! Telemetry cache, operator key dispatch and the reset handshake.
//!
//! ## Reset handshake
//!
//! | Event | Console action |
//! |---|---|
//! | `'r'` | Reset → both motors, ResetStarted → issuer, arm wait |
//! | armed and `|x|, |z| < ε` | ResetComplete → issuer, disarm |
//! | `'s'` | Stop → issuer and both motors, disarm |
//!
//! Completion is only meaningful relative to an armed wait: an axis pair
//! resting at zero at startup never produces ResetComplete.

use hoist_common::motion::Axis;
use hoist_common::peer::{HoistSignal, Peer, PeerSignaller};
use hoist_common::signals::SignalError;
use tracing::{debug, info};

/// Key that stops both axes.
pub const KEY_STOP: u8 = b's';
/// Key that resets both axes.
pub const KEY_RESET: u8 = b'r';

/// What an accepted keystroke triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Stop sent to issuer and motors.
    Stop,
    /// Reset sent to motors, ResetStarted to issuer.
    Reset,
    /// Liveness pulse only.
    Ignored,
}

/// Console-side protocol state.
#[derive(Debug)]
pub struct InspectionConsole<S> {
    signaller: S,
    epsilon: f64,
    est_x: f64,
    est_z: f64,
    reset_armed: bool,
}

impl<S: PeerSignaller> InspectionConsole<S> {
    pub fn new(signaller: S, epsilon: f64) -> Self {
        Self {
            signaller,
            epsilon,
            est_x: 0.0,
            est_z: 0.0,
            reset_armed: false,
        }
    }

    pub fn signaller(&self) -> &S {
        &self.signaller
    }

    /// Cached `(x, z)` estimates.
    pub fn estimates(&self) -> (f64, f64) {
        (self.est_x, self.est_z)
    }

    pub fn reset_armed(&self) -> bool {
        self.reset_armed
    }

    /// Replace the cached estimate of `axis` with a fresh sample.
    pub fn ingest(&mut self, axis: Axis, sample: f32) {
        let value = f64::from(sample);
        match axis {
            Axis::X => self.est_x = value,
            Axis::Z => self.est_z = value,
        }
    }

    /// Handle one operator keystroke.
    ///
    /// Every key pulses the watchdog before anything else.
    pub fn handle_key(&mut self, key: u8) -> Result<KeyAction, SignalError> {
        self.signaller
            .send(Peer::Watchdog, HoistSignal::LivenessPulse)?;

        match key {
            KEY_STOP => {
                self.signaller.send(Peer::Issuer, HoistSignal::Stop)?;
                for axis in Axis::ALL {
                    self.signaller.send(Peer::Motor(axis), HoistSignal::Stop)?;
                }
                if self.reset_armed {
                    debug!("Reset wait cleared by stop");
                }
                self.reset_armed = false;
                info!("Stop requested");
                Ok(KeyAction::Stop)
            }
            KEY_RESET => {
                for axis in Axis::ALL {
                    self.signaller.send(Peer::Motor(axis), HoistSignal::Reset)?;
                }
                self.signaller
                    .send(Peer::Issuer, HoistSignal::ResetStarted)?;
                self.reset_armed = true;
                info!("Reset requested");
                Ok(KeyAction::Reset)
            }
            _ => Ok(KeyAction::Ignored),
        }
    }

    /// Send ResetComplete if a reset is armed and both estimates are at
    /// zero. Returns whether it was sent.
    pub fn check_reset_complete(&mut self) -> Result<bool, SignalError> {
        if !self.reset_armed {
            return Ok(false);
        }
        if self.est_x.abs() < self.epsilon && self.est_z.abs() < self.epsilon {
            self.signaller
                .send(Peer::Issuer, HoistSignal::ResetComplete)?;
            self.reset_armed = false;
            info!("Reset complete");
            return Ok(true);
        }
        Ok(false)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
