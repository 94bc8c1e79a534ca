//! # Hoist Inspection Console Library
//!
//! Supervisory console of the hoist. Every tick it caches the newest
//! estimate of each axis, turns at most one operator keystroke into
//! preemptive signals, arbitrates the reset-completion handshake with the
//! command issuer and redraws a top-down view of the hoist.
//!
//! ## Modules
//!
//! - [`console`] - Telemetry cache, key dispatch, reset handshake
//! - [`render`] - Grid mapping, drawing surface, terminal backend
//! - [`keyboard`] - Non-blocking operator input
//! - [`cycle`] - Fixed-period console loop
//! - [`error`] - Console error type

pub mod console;
pub mod cycle;
pub mod error;
pub mod keyboard;
pub mod render;
