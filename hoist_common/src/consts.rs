//! System-wide constants for the hoist workspace.
//!
//! Single source of truth for tick periods, axis envelopes and default
//! channel paths. Every value here is the default behind a TOML override.

/// Motor controller tick period in milliseconds.
pub const MOTOR_TICK_MS: u64 = 20;

/// Inspection console tick period in milliseconds.
pub const CONSOLE_TICK_MS: u64 = 15;

/// Distance travelled by an axis in one tick.
pub const AXIS_STEP: f64 = 0.01;

/// Half-width of the uniform noise added to the estimated position.
pub const NOISE_AMPLITUDE: f64 = 0.005;

/// Lower bound of the Z envelope.
pub const Z_LOWER: f64 = 0.0;

/// Upper bound of the Z envelope.
pub const Z_UPPER: f64 = 9.9;

/// Lower bound of the X envelope.
pub const X_LOWER: f64 = 0.0;

/// Upper bound of the X envelope.
pub const X_UPPER: f64 = 9.9;

/// Both estimates must be below this magnitude for a reset to count as done.
pub const RESET_EPSILON: f64 = 0.001;

/// Tolerance for limit comparisons against accumulated float steps.
pub const LIMIT_TOLERANCE: f64 = 1e-9;

/// Default FIFO carrying X motion commands.
pub const FIFO_COMMAND_X: &str = "/tmp/hoist_cmd_x";

/// Default FIFO carrying Z motion commands.
pub const FIFO_COMMAND_Z: &str = "/tmp/hoist_cmd_z";

/// Default FIFO carrying X estimated positions.
pub const FIFO_POSITION_X: &str = "/tmp/hoist_est_pos_x";

/// Default FIFO carrying Z estimated positions.
pub const FIFO_POSITION_Z: &str = "/tmp/hoist_est_pos_z";

/// Default FIFO carrying the command issuer's pid to the console.
pub const FIFO_ISSUER_PID: &str = "/tmp/hoist_issuer_pid";

/// Default append-only log file, shared by all processes.
pub const DEFAULT_LOG_FILE: &str = "Log.txt";
