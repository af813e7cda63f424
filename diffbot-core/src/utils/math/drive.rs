//! Differential-drive mapping for a two-wheeled robot.
//!
//! Steering is done purely by reversing one wheel while the other runs
//! forward, so every turn is a pivot in place:
//!
//! | Command   | Left    | Right   |
//! |-----------|---------|---------|
//! | Forward   | forward | forward |
//! | Backward  | reverse | reverse |
//! | TurnLeft  | reverse | forward |
//! | TurnRight | forward | reverse |
//! | Stop      | duty 0  | duty 0  |
//!
//! # Example
//! ```rust
//! use diffbot_core::utils::controllers::{Direction, MotionCommand, Speed};
//! use diffbot_core::utils::math::drive::{setpoint, ChannelSetpoint};
//! let sp = setpoint(MotionCommand::TurnLeft, Speed::MAX);
//! assert_eq!(
//!     sp.left,
//!     ChannelSetpoint::Drive { direction: Direction::Reverse, duty: Speed::MAX }
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::controllers::{Direction, MotionCommand, Speed};

/// Target state for a single channel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSetpoint {
    /// Set the direction pins, then apply `duty`.
    Drive { direction: Direction, duty: Speed },
    /// Zero duty; direction pins keep their last value.
    Release,
}

impl ChannelSetpoint {
    pub fn duty(&self) -> Speed {
        match *self {
            ChannelSetpoint::Drive { duty, .. } => duty,
            ChannelSetpoint::Release => Speed::ZERO,
        }
    }

    /// Requested direction, `None` when releasing.
    pub fn direction(&self) -> Option<Direction> {
        match *self {
            ChannelSetpoint::Drive { direction, .. } => Some(direction),
            ChannelSetpoint::Release => None,
        }
    }
}

/// Setpoints for both wheels.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DriveSetpoint {
    pub left: ChannelSetpoint,
    pub right: ChannelSetpoint,
}

/// Compute the wheel setpoints for `command` at `speed`.
pub fn setpoint(
    command: MotionCommand,
    speed: Speed,
) -> DriveSetpoint {
    let (left, right) = match command {
        MotionCommand::Forward => (Some(true), Some(true)),
        MotionCommand::Backward => (Some(false), Some(false)),
        MotionCommand::TurnLeft => (Some(false), Some(true)),
        MotionCommand::TurnRight => (Some(true), Some(false)),
        MotionCommand::Stop => (None, None),
    };
    DriveSetpoint {
        left: channel_setpoint(left, speed),
        right: channel_setpoint(right, speed),
    }
}

fn channel_setpoint(
    forward: Option<bool>,
    speed: Speed,
) -> ChannelSetpoint {
    match forward {
        Some(forward) => ChannelSetpoint::Drive {
            direction: Direction::from_forward(forward),
            duty: speed,
        },
        None => ChannelSetpoint::Release,
    }
}
