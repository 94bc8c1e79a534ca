//! Asynchronous signal latch.
//!
//! OS signal handlers may run between any two instructions of the control
//! loop. They therefore do exactly one thing: `fetch_or` a bit into an
//! [`SignalLatch`]. The loop drains the latch once per tick and resolves the
//! pending kinds synchronously, so state transitions are only observed at
//! tick boundaries.
//!
//! ## Protocol
//!
//! - Writer: the signal handler (`raise`), lock-free and allocation-free.
//! - Reader: the control loop (`drain`), an atomic swap to zero.
//!
//! A bitmask rather than a single slot keeps a Stop and a Reset delivered in
//! the same tick both visible to the loop.

use bitflags::bitflags;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;
use tracing::debug;

/// Kind of preemptive event a process can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Abort motion immediately (`SIGUSR1`).
    Stop,
    /// Begin return-to-zero (`SIGUSR2`).
    Reset,
    /// Terminal size changed (`SIGWINCH`).
    Resize,
}

impl SignalKind {
    /// OS signal carrying this kind.
    pub const fn os_signal(self) -> Signal {
        match self {
            Self::Stop => Signal::SIGUSR1,
            Self::Reset => Signal::SIGUSR2,
            Self::Resize => Signal::SIGWINCH,
        }
    }

    /// Latch bit for this kind.
    pub const fn flag(self) -> PendingSignals {
        match self {
            Self::Stop => PendingSignals::STOP,
            Self::Reset => PendingSignals::RESET,
            Self::Resize => PendingSignals::RESIZE,
        }
    }
}

bitflags! {
    /// Set of signal kinds raised since the last drain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PendingSignals: u8 {
        const STOP   = 1 << 0;
        const RESET  = 1 << 1;
        const RESIZE = 1 << 2;
    }
}

impl PendingSignals {
    /// Kinds contained in this set, in resolution order (Stop before Reset).
    pub fn kinds(self) -> impl Iterator<Item = SignalKind> {
        [SignalKind::Stop, SignalKind::Reset, SignalKind::Resize]
            .into_iter()
            .filter(move |k| self.contains(k.flag()))
    }
}

/// Single-writer/single-reader atomic mailbox between a signal handler and
/// the control loop.
#[derive(Debug)]
pub struct SignalLatch {
    bits: AtomicU8,
}

impl SignalLatch {
    /// Create an empty latch.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Record a kind. Async-signal-safe.
    #[inline]
    pub fn raise(&self, kind: SignalKind) {
        self.bits.fetch_or(kind.flag().bits(), Ordering::SeqCst);
    }

    /// Take every pending kind and clear the latch.
    #[inline]
    pub fn drain(&self) -> PendingSignals {
        PendingSignals::from_bits_truncate(self.bits.swap(0, Ordering::SeqCst))
    }
}

impl Default for SignalLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide latch written by [`latch_handler`].
///
/// A raw signal handler receives no context pointer, so the mailbox it
/// writes to has to be reachable statically. Nothing else lives here.
static PROCESS_LATCH: SignalLatch = SignalLatch::new();

/// Error type for signal registration and delivery.
#[derive(Debug, Error)]
pub enum SignalError {
    /// `sigaction` rejected the handler.
    #[error("failed to register handler for {signal}: {source}")]
    Register {
        signal: Signal,
        #[source]
        source: nix::Error,
    },

    /// `kill` failed for a peer.
    #[error("failed to send {signal} to pid {pid}: {source}")]
    Deliver {
        signal: Signal,
        pid: i32,
        #[source]
        source: nix::Error,
    },
}

extern "C" fn latch_handler(signo: libc::c_int) {
    let kind = match signo {
        libc::SIGUSR1 => SignalKind::Stop,
        libc::SIGUSR2 => SignalKind::Reset,
        libc::SIGWINCH => SignalKind::Resize,
        _ => return,
    };
    PROCESS_LATCH.raise(kind);
}

/// Route the OS signals of `kinds` into the process latch.
///
/// Handlers are installed with `SA_RESTART` so an interrupted sleep or
/// channel call resumes instead of failing with `EINTR`.
pub fn install_handlers(kinds: &[SignalKind]) -> Result<&'static SignalLatch, SignalError> {
    let action = SigAction::new(
        SigHandler::Handler(latch_handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    for kind in kinds {
        let signal = kind.os_signal();
        // SAFETY: `latch_handler` only performs an atomic fetch_or.
        unsafe { sigaction(signal, &action) }
            .map_err(|source| SignalError::Register { signal, source })?;
        debug!("Installed handler for {signal} -> {kind:?}");
    }

    Ok(&PROCESS_LATCH)
}
