//! Arm control module
//!
//! Interprets arm commands, checks every demanded angle against the joint's bounds, and moves the
//! joints to their targets one degree per cycle so the arm never jumps between positions.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod actuator;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use actuator::*;
pub use params::*;
pub use state::*;

use comms_if::{eqpt::JointId, tc::ArmResponse};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Target of {angle_deg} deg for the {joint} is outside its range [{min_deg}, {max_deg}]")]
    OutOfRange {
        joint: JointId,
        angle_deg: i32,
        min_deg: i32,
        max_deg: i32,
    },

    #[error("Unrecognised command {:?}", *.0 as char)]
    UnknownCommand(u8),

    #[error("No angle was given for the {0}")]
    MissingAngle(JointId),

    #[error("The motion queue is full")]
    QueueFull,

    #[error("ArmCtrl has not been initialised")]
    NotInitialised,

    #[error("Invalid ArmCtrl parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrlError {
    /// The response which reports this error to the operator, if it is one the operator caused.
    pub fn response(&self) -> Option<ArmResponse> {
        match *self {
            ArmCtrlError::OutOfRange {
                joint,
                angle_deg,
                min_deg,
                max_deg,
            } => Some(ArmResponse::OutOfRange {
                joint,
                angle_deg,
                min_deg,
                max_deg,
            }),
            ArmCtrlError::UnknownCommand(b) => Some(ArmResponse::UnknownCommand(b)),
            ArmCtrlError::MissingAngle(joint) => Some(ArmResponse::MissingAngle { joint }),
            ArmCtrlError::QueueFull => Some(ArmResponse::Busy),
            ArmCtrlError::NotInitialised | ArmCtrlError::InvalidParams(_) => None,
        }
    }
}
