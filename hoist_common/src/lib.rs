//! Hoist Common Library
//!
//! Shared building blocks for the hoist processes: the per-axis motion
//! types, the fixed-record FIFO channels, the asynchronous signal protocol,
//! the append-only event log and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - Tick periods, limits and default channel paths
//! - [`motion`] - Axis, motion command and controller state types
//! - [`link`] - Fixed-record channels (PositionLink, CommandLink, PidHandoff)
//! - [`signals`] - Async-signal-safe latch and handler registration
//! - [`peer`] - Peer processes and the out-of-band signal mapping
//! - [`event_log`] - Append-only timestamped log file
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hoist_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod event_log;
pub mod link;
pub mod motion;
pub mod peer;
pub mod prelude;
pub mod signals;
