//! Motion types shared by the motor controllers, the console and the
//! command issuer.
//!
//! `MotionCommand` is the wire type of the CommandLink and therefore keeps
//! the exact integer codes used on the channel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::{X_LOWER, X_UPPER, Z_LOWER, Z_UPPER};

/// One of the two hoist axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal travel.
    X,
    /// Vertical travel (hook height).
    Z,
}

impl Axis {
    /// Both axes, in display order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Z];

    /// Lowercase name used in log lines and CLI arguments.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Z => "z",
        }
    }

    /// Default travel envelope of this axis.
    pub const fn default_limits(self) -> AxisLimits {
        match self {
            Axis::X => AxisLimits {
                lower: X_LOWER,
                upper: X_UPPER,
            },
            Axis::Z => AxisLimits {
                lower: Z_LOWER,
                upper: Z_UPPER,
            },
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{other}' (expected 'x' or 'z')")),
        }
    }
}

/// Closed travel interval `[lower, upper]` of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    /// Lower bound, also the reset target.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl AxisLimits {
    /// Whether `position` lies inside the envelope.
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.lower && position <= self.upper
    }
}

/// Motion command carried by the CommandLink.
///
/// Only one command is live at a time; a newer one always replaces the
/// previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum MotionCommand {
    /// No motion requested.
    #[default]
    None = 0,
    /// Move toward the upper bound.
    Increase = 1,
    /// Move toward the lower bound.
    Decrease = 2,
    /// Halt immediately.
    Stop = 5,
}

impl MotionCommand {
    /// Convert from the raw wire code. Returns `None` for unknown codes.
    #[inline]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Increase),
            2 => Some(Self::Decrease),
            5 => Some(Self::Stop),
            _ => None,
        }
    }

    /// Raw wire code.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Whether the command moves the axis.
    #[inline]
    pub const fn is_motion(self) -> bool {
        matches!(self, Self::Increase | Self::Decrease)
    }
}

/// Motor controller state (initial `Stopped`, no terminal state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerState {
    /// Applying the current motion command every tick.
    Running,
    /// Idle, position held.
    #[default]
    Stopped,
    /// Returning to the lower bound.
    Resetting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_wire_format() {
        assert_eq!(MotionCommand::None.code(), 0);
        assert_eq!(MotionCommand::Increase.code(), 1);
        assert_eq!(MotionCommand::Decrease.code(), 2);
        assert_eq!(MotionCommand::Stop.code(), 5);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        for code in [3, 4, 6, -1, i32::MAX] {
            assert!(MotionCommand::from_code(code).is_none(), "code {code}");
        }
    }

    #[test]
    fn initial_state_is_stopped() {
        assert_eq!(ControllerState::default(), ControllerState::Stopped);
        assert_eq!(MotionCommand::default(), MotionCommand::None);
    }

    #[test]
    fn default_limits() {
        let z = Axis::Z.default_limits();
        assert_eq!(z.lower, 0.0);
        assert_eq!(z.upper, 9.9);
        assert!(z.contains(0.0));
        assert!(z.contains(9.9));
        assert!(!z.contains(9.91));
        assert!(Axis::X.default_limits().contains(5.0));
    }

    #[test]
    fn axis_parses_case_insensitively() {
        assert_eq!("x".parse::<Axis>(), Ok(Axis::X));
        assert_eq!("Z".parse::<Axis>(), Ok(Axis::Z));
        assert!("y".parse::<Axis>().is_err());
    }
}
