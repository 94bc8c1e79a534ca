//! # Peer Processes
//!
//! Identifies the cooperating hoist processes and the out-of-band signals
//! exchanged between them. The watchdog and the command issuer are external
//! collaborators: this module only captures what they receive.
//!
//! | Signal | OS signal | Receiver |
//! |---|---|---|
//! | Stop | `SIGUSR1` | motor controllers, issuer |
//! | Reset | `SIGUSR2` | motor controllers |
//! | ResetStarted | `SIGUSR2` | issuer |
//! | ResetComplete | `SIGUSR1` | issuer |
//! | LivenessPulse | `SIGTSTP` | watchdog |

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::trace;

use crate::motion::Axis;
use crate::signals::SignalError;

/// A process the console addresses by pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peer {
    /// Motor controller of one axis (`hoist_motor`).
    Motor(Axis),
    /// Liveness watchdog.
    Watchdog,
    /// Command issuer (learned over the PidHandoff channel).
    Issuer,
}

/// Out-of-band notification sent from one hoist process to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoistSignal {
    /// Abort motion immediately.
    Stop,
    /// Begin return-to-zero.
    Reset,
    /// Tell the issuer a reset is in progress.
    ResetStarted,
    /// Tell the issuer both axes reached zero.
    ResetComplete,
    /// Prove the operator input path is serviced.
    LivenessPulse,
}

impl HoistSignal {
    /// OS signal carrying this notification.
    pub const fn os_signal(self) -> Signal {
        match self {
            Self::Stop | Self::ResetComplete => Signal::SIGUSR1,
            Self::Reset | Self::ResetStarted => Signal::SIGUSR2,
            Self::LivenessPulse => Signal::SIGTSTP,
        }
    }
}

/// Delivers [`HoistSignal`]s to peers.
///
/// The console is written against this trait so the reset handshake can be
/// exercised without real processes.
pub trait PeerSignaller {
    /// Send `signal` to `peer`.
    fn send(&mut self, peer: Peer, signal: HoistSignal) -> Result<(), SignalError>;
}

/// Pids of every peer the console talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerDirectory {
    pub motor_x: i32,
    pub motor_z: i32,
    pub watchdog: i32,
    pub issuer: i32,
}

impl PeerDirectory {
    /// Pid of `peer`.
    pub const fn pid(&self, peer: Peer) -> i32 {
        match peer {
            Peer::Motor(Axis::X) => self.motor_x,
            Peer::Motor(Axis::Z) => self.motor_z,
            Peer::Watchdog => self.watchdog,
            Peer::Issuer => self.issuer,
        }
    }

    /// First peer whose pid is not a single positive process id.
    ///
    /// `kill(2)` treats `0` as the caller's process group and negative
    /// values as groups or every permitted process.
    pub fn invalid_peer(&self) -> Option<(Peer, i32)> {
        [
            Peer::Motor(Axis::X),
            Peer::Motor(Axis::Z),
            Peer::Watchdog,
            Peer::Issuer,
        ]
        .into_iter()
        .map(|peer| (peer, self.pid(peer)))
        .find(|&(_, pid)| pid <= 0)
    }
}

/// [`PeerSignaller`] backed by `kill(2)`.
#[derive(Debug, Clone)]
pub struct KillSignaller {
    peers: PeerDirectory,
}

impl KillSignaller {
    pub fn new(peers: PeerDirectory) -> Self {
        Self { peers }
    }
}

impl PeerSignaller for KillSignaller {
    fn send(&mut self, peer: Peer, signal: HoistSignal) -> Result<(), SignalError> {
        let pid = self.peers.pid(peer);
        let os = signal.os_signal();
        kill(Pid::from_raw(pid), os).map_err(|source| SignalError::Deliver {
            signal: os,
            pid,
            source,
        })?;
        trace!("{signal:?} ({os}) -> {peer:?} [{pid}]");
        Ok(())
    }
}
