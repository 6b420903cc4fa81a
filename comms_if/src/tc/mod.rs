//! # Telecommand module
//!
//! This module provides the arm's serial command protocol. Commands are single ASCII characters,
//! with manual mode joint commands being a joint selector followed by an integer angle in degrees:
//!
//! | Token                     | Command                       |
//! |---------------------------|-------------------------------|
//! | `h`                       | [`ArmCmd::Home`]              |
//! | `o`                       | [`ArmCmd::OpenGripper`]       |
//! | `c`                       | [`ArmCmd::CloseGripper`]      |
//! | `m`                       | [`ArmCmd::EnterManual`]       |
//! | `x`                       | [`ArmCmd::ExitManual`]        |
//! | `{b,s,e,w,g}<angle>`      | [`ArmCmd::SetJoint`]          |
//!
//! Whitespace (including newlines) between tokens is ignored. Any other byte is parsed as
//! [`ArmCmd::Unknown`]. Which commands are acceptable in which controller mode is decided by the
//! controller, not by the parser.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod parser;
mod response;

pub use parser::CmdParser;
pub use response::{ArmResponse, ParseResponseError};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::eqpt::JointId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TOKEN_HOME: u8 = b'h';
pub const TOKEN_OPEN_GRIPPER: u8 = b'o';
pub const TOKEN_CLOSE_GRIPPER: u8 = b'c';
pub const TOKEN_ENTER_MANUAL: u8 = b'm';
pub const TOKEN_EXIT_MANUAL: u8 = b'x';

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command parsed from the serial channel.
///
/// Commands are transient: they are created per input event and consumed immediately by the
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmCmd {
    /// Move all joints to their home angles and open the gripper.
    Home,

    /// Move the gripper to its open angle.
    OpenGripper,

    /// Move the gripper to its closed angle.
    CloseGripper,

    /// Enter the manual (per joint) command mode.
    EnterManual,

    /// Set a single joint to the given angle.
    ///
    /// `angle_deg` is `None` if the selector was not followed by an integer.
    SetJoint {
        joint: JointId,
        angle_deg: Option<i32>,
    },

    /// Leave manual mode.
    ExitManual,

    /// A byte which isn't part of the protocol.
    Unknown(u8),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCmd {
    /// The leading byte of the command on the wire.
    pub fn token(&self) -> u8 {
        match self {
            ArmCmd::Home => TOKEN_HOME,
            ArmCmd::OpenGripper => TOKEN_OPEN_GRIPPER,
            ArmCmd::CloseGripper => TOKEN_CLOSE_GRIPPER,
            ArmCmd::EnterManual => TOKEN_ENTER_MANUAL,
            ArmCmd::ExitManual => TOKEN_EXIT_MANUAL,
            ArmCmd::SetJoint { joint, .. } => joint.selector(),
            ArmCmd::Unknown(b) => *b,
        }
    }

    /// Encode the command into the text sent over the wire.
    ///
    /// Joint commands are newline terminated so the controller doesn't have to wait for its
    /// integer timeout to know the angle is complete.
    pub fn to_wire(&self) -> String {
        match self {
            ArmCmd::Home => (TOKEN_HOME as char).to_string(),
            ArmCmd::OpenGripper => (TOKEN_OPEN_GRIPPER as char).to_string(),
            ArmCmd::CloseGripper => (TOKEN_CLOSE_GRIPPER as char).to_string(),
            ArmCmd::EnterManual => (TOKEN_ENTER_MANUAL as char).to_string(),
            ArmCmd::ExitManual => (TOKEN_EXIT_MANUAL as char).to_string(),
            ArmCmd::SetJoint { joint, angle_deg } => match angle_deg {
                Some(a) => format!("{}{}\n", joint.selector() as char, a),
                None => format!("{}\n", joint.selector() as char),
            },
            ArmCmd::Unknown(b) => (*b as char).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wire_is_parseable() {
        let cmds = [
            ArmCmd::EnterManual,
            ArmCmd::SetJoint {
                joint: JointId::Wrist,
                angle_deg: Some(-12),
            },
            ArmCmd::SetJoint {
                joint: JointId::Gripper,
                angle_deg: Some(90),
            },
            ArmCmd::ExitManual,
            ArmCmd::Home,
        ];

        let wire: String = cmds.iter().map(|c| c.to_wire()).collect();

        let mut parser = CmdParser::new();
        let parsed = parser.feed(wire.as_bytes());

        assert_eq!(parsed, cmds.to_vec());
        assert!(!parser.is_pending());
    }
}
