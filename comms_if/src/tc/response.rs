//! Operator facing responses sent back over the serial channel

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::eqpt::JointId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A line of text sent by the arm controller to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmResponse {
    /// Startup is complete and commands are accepted.
    Ready,

    /// Homing has been queued.
    Homing,

    /// All joints have reached their home angles.
    HomeReached,

    /// The gripper has reached its open angle.
    GripperOpened,

    /// The gripper has reached its closed angle.
    GripperClosed,

    /// Manual mode has been entered.
    ManualEntered,

    /// Manual mode has been left.
    ManualExited,

    /// A manual move has completed.
    JointReached { joint: JointId, angle_deg: i32 },

    /// A requested angle was outside the joint's bounds, nothing moved.
    OutOfRange {
        joint: JointId,
        angle_deg: i32,
        min_deg: i32,
        max_deg: i32,
    },

    /// A joint selector was received without an angle.
    MissingAngle { joint: JointId },

    /// The byte isn't a command in the current mode.
    UnknownCommand(u8),

    /// The motion queue is full, the command was dropped.
    Busy,
}

/// Error returned when a line isn't a response the controller sends.
#[derive(thiserror::Error, Debug, PartialEq)]
#[error("\"{0}\" is not an arm response")]
pub struct ParseResponseError(pub String);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmResponse {
    /// True if the response reports a rejected command.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ArmResponse::OutOfRange { .. }
                | ArmResponse::MissingAngle { .. }
                | ArmResponse::UnknownCommand(_)
                | ArmResponse::Busy
        )
    }
}

impl fmt::Display for ArmResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmResponse::Ready => write!(f, "Ready"),
            ArmResponse::Homing => write!(f, "Homing..."),
            ArmResponse::HomeReached => write!(f, "Home position reached"),
            ArmResponse::GripperOpened => write!(f, "Gripper opened"),
            ArmResponse::GripperClosed => write!(f, "Gripper closed"),
            ArmResponse::ManualEntered => {
                write!(f, "Manual mode: b/s/e/w/g followed by an angle, x to exit")
            }
            ArmResponse::ManualExited => write!(f, "Exited manual mode"),
            ArmResponse::JointReached { joint, angle_deg } => {
                write!(f, "{} at {}", joint, angle_deg)
            }
            ArmResponse::OutOfRange {
                joint,
                angle_deg,
                min_deg,
                max_deg,
            } => write!(
                f,
                "Error: {} angle {} out of range [{}, {}]",
                joint, angle_deg, min_deg, max_deg
            ),
            ArmResponse::MissingAngle { joint } => write!(f, "Error: no angle given for {}", joint),
            // The hex code is what gets parsed back, the character is only shown when printable
            ArmResponse::UnknownCommand(b) if b.is_ascii_graphic() => {
                write!(f, "Unknown command: '{}' (0x{:02x})", *b as char, b)
            }
            ArmResponse::UnknownCommand(b) => write!(f, "Unknown command: 0x{:02x}", b),
            ArmResponse::Busy => write!(f, "Error: busy, command dropped"),
        }
    }
}

impl FromStr for ArmResponse {
    type Err = ParseResponseError;

    /// Parse a line produced by the `Display` implementation, without its line terminator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let err = || ParseResponseError(line.to_string());

        let fixed = [
            ArmResponse::Ready,
            ArmResponse::Homing,
            ArmResponse::HomeReached,
            ArmResponse::GripperOpened,
            ArmResponse::GripperClosed,
            ArmResponse::ManualEntered,
            ArmResponse::ManualExited,
            ArmResponse::Busy,
        ];
        if let Some(r) = fixed.iter().find(|r| r.to_string() == line) {
            return Ok(r.clone());
        }

        if let Some(rest) = line.strip_prefix("Error: no angle given for ") {
            let joint = rest.parse().map_err(|_| err())?;
            return Ok(ArmResponse::MissingAngle { joint });
        }

        if let Some(rest) = line.strip_prefix("Error: ") {
            // "{joint} angle {angle} out of range [{min}, {max}]"
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if tokens.len() != 8 || tokens[1] != "angle" || tokens[5] != "range" {
                return Err(err());
            }

            return Ok(ArmResponse::OutOfRange {
                joint: tokens[0].parse().map_err(|_| err())?,
                angle_deg: tokens[2].parse().map_err(|_| err())?,
                min_deg: tokens[6]
                    .trim_start_matches('[')
                    .trim_end_matches(',')
                    .parse()
                    .map_err(|_| err())?,
                max_deg: tokens[7].trim_end_matches(']').parse().map_err(|_| err())?,
            });
        }

        if let Some(rest) = line.strip_prefix("Unknown command: ") {
            let hex = match rest.rfind("(0x") {
                Some(i) => rest[i + 3..].strip_suffix(')'),
                None => rest.strip_prefix("0x"),
            }
            .ok_or_else(err)?;

            return u8::from_str_radix(hex, 16)
                .map(ArmResponse::UnknownCommand)
                .map_err(|_| err());
        }

        // "{joint} at {angle}"
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() == 3 && tokens[1] == "at" {
            return Ok(ArmResponse::JointReached {
                joint: tokens[0].parse().map_err(|_| err())?,
                angle_deg: tokens[2].parse().map_err(|_| err())?,
            });
        }

        Err(err())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_lines() {
        assert_eq!("Ready".parse(), Ok(ArmResponse::Ready));
        assert_eq!("Home position reached\r".parse(), Ok(ArmResponse::HomeReached));
        assert_eq!(
            "base at 45".parse(),
            Ok(ArmResponse::JointReached {
                joint: JointId::Base,
                angle_deg: 45
            })
        );
        assert_eq!(
            "Error: shoulder angle 10 out of range [15, 165]".parse(),
            Ok(ArmResponse::OutOfRange {
                joint: JointId::Shoulder,
                angle_deg: 10,
                min_deg: 15,
                max_deg: 165
            })
        );
        assert_eq!(
            "Error: no angle given for wrist".parse(),
            Ok(ArmResponse::MissingAngle {
                joint: JointId::Wrist
            })
        );
        assert_eq!(
            "Unknown command: 'z' (0x7a)".parse(),
            Ok(ArmResponse::UnknownCommand(b'z'))
        );
        assert_eq!(
            "Unknown command: 0x07".parse(),
            Ok(ArmResponse::UnknownCommand(7))
        );
        assert!("Unknown command: 'z'".parse::<ArmResponse>().is_err());
        assert!("elbow at".parse::<ArmResponse>().is_err());
        assert!("hello".parse::<ArmResponse>().is_err());
    }

    #[test]
    fn test_display_is_parseable() {
        let responses = [
            ArmResponse::ManualEntered,
            ArmResponse::GripperClosed,
            ArmResponse::Busy,
            ArmResponse::JointReached {
                joint: JointId::Gripper,
                angle_deg: -3,
            },
            ArmResponse::OutOfRange {
                joint: JointId::Elbow,
                angle_deg: 181,
                min_deg: 0,
                max_deg: 180,
            },
            ArmResponse::UnknownCommand(b'q'),
        ];

        for r in responses.iter() {
            assert_eq!(r.to_string().parse::<ArmResponse>().as_ref(), Ok(r));
        }
    }

    #[test]
    fn test_unknown_command_every_byte() {
        assert_eq!(
            ArmResponse::UnknownCommand(b'\'').to_string(),
            "Unknown command: ''' (0x27)"
        );
        assert_eq!(
            ArmResponse::UnknownCommand(b' ').to_string(),
            "Unknown command: 0x20"
        );

        for b in 0..=u8::MAX {
            let line = ArmResponse::UnknownCommand(b).to_string();
            assert_eq!(
                line.parse::<ArmResponse>(),
                Ok(ArmResponse::UnknownCommand(b)),
                "{}",
                line
            );
        }
    }
}
