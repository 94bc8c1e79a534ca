//! Prelude module for common re-exports.
//!
//! ```rust
//! use hoist_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, HoistConfig, LogLevel, SharedConfig};

// ─── Motion ─────────────────────────────────────────────────────────
pub use crate::motion::{Axis, AxisLimits, ControllerState, MotionCommand};

// ─── Channels ───────────────────────────────────────────────────────
pub use crate::link::{
    CommandReader, CommandWriter, LinkError, PidReader, PositionReader, PositionWriter,
    ensure_fifo,
};

// ─── Signals ────────────────────────────────────────────────────────
pub use crate::peer::{HoistSignal, KillSignaller, Peer, PeerDirectory, PeerSignaller};
pub use crate::signals::{PendingSignals, SignalError, SignalKind, SignalLatch};

// ─── Event log ──────────────────────────────────────────────────────
pub use crate::event_log::EventLog;
