//! Motor controller error types.

use hoist_common::config::ConfigError;
use hoist_common::link::LinkError;
use hoist_common::signals::SignalError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the motor controller.
#[derive(Debug, Error)]
pub enum MotorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("channel error: {0}")]
    Link(#[from] LinkError),

    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("cannot open event log {path:?}: {source}")]
    EventLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
