//! # Hoist Motor Controller Library
//!
//! One controller process per axis. Each tick it reads the newest motion
//! command, resolves the preemptive signals latched since the previous tick,
//! advances the motion state machine and publishes a noisy position
//! estimate to the inspection console.
//!
//! ## State Machine
//!
//! `Stopped` (initial) ↔ `Running`, any → `Resetting` → `Stopped`.
//! Signal handlers never touch the controller: they set latch bits that
//! [`cycle::MotorRunner`] drains at the top of each tick.

pub mod controller;
pub mod cycle;
pub mod error;
