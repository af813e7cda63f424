//! Serial command protocol.
//!
//! One ASCII byte per command, no framing or terminator. Letters are matched
//! case-insensitively; every other byte is ignored. Each accepted command is
//! answered with a human-readable status line that is not meant to be parsed.

use crate::utils::controllers::MotionCommand;

/// Lines written once when the controller starts.
pub const BANNER: [&str; 2] = ["Motor Control Ready", "Waiting for commands..."];

/// Terminator appended to every status line.
pub const LINE_ENDING: &[u8] = b"\r\n";

impl MotionCommand {
    /// Decode a command byte. Unknown bytes yield `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte.to_ascii_uppercase() {
            b'F' => Some(MotionCommand::Forward),
            b'B' => Some(MotionCommand::Backward),
            b'L' => Some(MotionCommand::TurnLeft),
            b'R' => Some(MotionCommand::TurnRight),
            b'S' => Some(MotionCommand::Stop),
            _ => None,
        }
    }

    /// Canonical (upper-case) byte for this command.
    pub fn as_byte(self) -> u8 {
        match self {
            MotionCommand::Forward => b'F',
            MotionCommand::Backward => b'B',
            MotionCommand::TurnLeft => b'L',
            MotionCommand::TurnRight => b'R',
            MotionCommand::Stop => b'S',
        }
    }

    /// Status line reported after the command is applied.
    pub fn status(self) -> &'static str {
        match self {
            MotionCommand::Forward => "Moving Forward",
            MotionCommand::Backward => "Moving Backward",
            MotionCommand::TurnLeft => "Turning Left",
            MotionCommand::TurnRight => "Turning Right",
            MotionCommand::Stop => "Motors Stopped",
        }
    }
}
