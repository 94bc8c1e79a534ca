//! Inspection console error types.

use hoist_common::config::ConfigError;
use hoist_common::link::LinkError;
use hoist_common::peer::Peer;
use hoist_common::signals::SignalError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the inspection console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("channel error: {0}")]
    Link(#[from] LinkError),

    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("invalid pid {pid} for {peer:?}: must be positive")]
    InvalidPid { peer: Peer, pid: i32 },

    #[error("display error: {0}")]
    Display(#[source] std::io::Error),

    #[error("keyboard error: {0}")]
    Keyboard(#[source] std::io::Error),

    #[error("cannot open event log {path:?}: {source}")]
    EventLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
