//! # Arm joint identifiers

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of joints on the arm.
pub const NUM_JOINTS: usize = 5;

/// All joints of the arm, in the order they are homed.
pub const ARM_JOINTS: [JointId; NUM_JOINTS] = [
    JointId::Base,
    JointId::Shoulder,
    JointId::Elbow,
    JointId::Wrist,
    JointId::Gripper,
];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators available on the arm.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    Base,
    Shoulder,
    Elbow,
    Wrist,
    Gripper,
}

/// Error returned when a joint name or selector can't be parsed.
#[derive(thiserror::Error, Debug, PartialEq)]
#[error("\"{0}\" is not a joint (expected one of base, shoulder, elbow, wrist, gripper or b/s/e/w/g)")]
pub struct ParseJointError(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// The single character used to select this joint in manual mode.
    pub fn selector(&self) -> u8 {
        match self {
            JointId::Base => b'b',
            JointId::Shoulder => b's',
            JointId::Elbow => b'e',
            JointId::Wrist => b'w',
            JointId::Gripper => b'g',
        }
    }

    /// Get the joint matching a manual mode selector byte.
    pub fn from_selector(selector: u8) -> Option<Self> {
        ARM_JOINTS.iter().copied().find(|j| j.selector() == selector)
    }

    /// Index of this joint into arrays ordered like [`ARM_JOINTS`].
    pub fn index(&self) -> usize {
        match self {
            JointId::Base => 0,
            JointId::Shoulder => 1,
            JointId::Elbow => 2,
            JointId::Wrist => 3,
            JointId::Gripper => 4,
        }
    }

    /// Lowercase name of the joint.
    pub fn name(&self) -> &'static str {
        match self {
            JointId::Base => "base",
            JointId::Shoulder => "shoulder",
            JointId::Elbow => "elbow",
            JointId::Wrist => "wrist",
            JointId::Gripper => "gripper",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for JointId {
    type Err = ParseJointError;

    /// Accepts either the full joint name or its single character selector.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();

        if lower.len() == 1 {
            if let Some(j) = JointId::from_selector(lower.as_bytes()[0]) {
                return Ok(j);
            }
        }

        ARM_JOINTS
            .iter()
            .copied()
            .find(|j| j.name() == lower)
            .ok_or_else(|| ParseJointError(s.to_string()))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_selectors() {
        for j in ARM_JOINTS.iter() {
            assert_eq!(JointId::from_selector(j.selector()), Some(*j));
            assert_eq!(ARM_JOINTS[j.index()], *j);
        }

        assert_eq!(JointId::from_selector(b'x'), None);
        assert_eq!(JointId::from_selector(b'h'), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("shoulder".parse::<JointId>(), Ok(JointId::Shoulder));
        assert_eq!("G".parse::<JointId>(), Ok(JointId::Gripper));
        assert!("knee".parse::<JointId>().is_err());
    }
}
