//! # Pose library
//!
//! Named arm poses and the pose sequences used for folding laundry.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{JointId, NUM_JOINTS};
use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Poses which are always available.
///
/// Gripper angles run from 10 (open) to 90 (closed).
const BUILTIN_POSES: [(&str, [i32; NUM_JOINTS]); 9] = [
    ("home", [90, 90, 90, 90, 10]),
    ("pickup", [90, 45, 135, 90, 10]),
    ("grip", [90, 45, 135, 90, 90]),
    ("lift", [90, 75, 90, 90, 90]),
    ("fold_start", [60, 60, 120, 45, 90]),
    ("fold_middle", [90, 90, 90, 90, 70]),
    ("fold_end", [120, 60, 120, 135, 50]),
    ("place", [90, 45, 120, 90, 10]),
    ("rest", [90, 120, 60, 90, 10]),
];

const BUILTIN_SEQUENCES: [(&str, &[&str]); 2] = [
    (
        "towel_fold",
        &[
            "home",
            "pickup",
            "grip",
            "lift",
            "fold_start",
            "fold_middle",
            "fold_end",
            "place",
            "home",
        ],
    ),
    (
        "shirt_fold",
        &[
            "home",
            "pickup",
            "grip",
            "lift",
            "fold_start",
            "rest",
            "fold_middle",
            "fold_end",
            "place",
            "home",
        ],
    ),
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A named set of joint angles.
///
/// All angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub name: String,
    pub base: i32,
    pub shoulder: i32,
    pub elbow: i32,
    pub wrist: i32,
    pub gripper: i32,
}

/// A named, ordered list of poses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub poses: Vec<String>,
}

/// All poses and sequences known to the client.
#[derive(Debug, Clone)]
pub struct PoseLibrary {
    poses: Vec<Pose>,

    sequences: Vec<Sequence>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PoseError {
    #[error("Pose \"{0}\" not found. Available poses: {1}")]
    UnknownPose(String, String),

    #[error("Sequence \"{0}\" not found. Available sequences: {1}")]
    UnknownSequence(String, String),

    #[error("Sequence \"{0}\" uses the unknown pose \"{1}\"")]
    SequenceUsesUnknownPose(String, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub fn new(name: &str, angles: [i32; NUM_JOINTS]) -> Self {
        Self {
            name: name.to_string(),
            base: angles[0],
            shoulder: angles[1],
            elbow: angles[2],
            wrist: angles[3],
            gripper: angles[4],
        }
    }

    /// Angle of one joint.
    pub fn angle_deg(&self, joint: JointId) -> i32 {
        match joint {
            JointId::Base => self.base,
            JointId::Shoulder => self.shoulder,
            JointId::Elbow => self.elbow,
            JointId::Wrist => self.wrist,
            JointId::Gripper => self.gripper,
        }
    }

    /// Copy of this pose with one joint moved.
    pub fn with_joint(&self, name: &str, joint: JointId, angle_deg: i32) -> Self {
        let mut pose = self.clone();
        pose.name = name.to_string();

        match joint {
            JointId::Base => pose.base = angle_deg,
            JointId::Shoulder => pose.shoulder = angle_deg,
            JointId::Elbow => pose.elbow = angle_deg,
            JointId::Wrist => pose.wrist = angle_deg,
            JointId::Gripper => pose.gripper = angle_deg,
        }

        pose
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose({}): base={}, shoulder={}, elbow={}, wrist={}, gripper={}",
            self.name, self.base, self.shoulder, self.elbow, self.wrist, self.gripper
        )
    }
}

impl Default for PoseLibrary {
    fn default() -> Self {
        Self {
            poses: BUILTIN_POSES
                .iter()
                .map(|(name, angles)| Pose::new(name, *angles))
                .collect(),
            sequences: BUILTIN_SEQUENCES
                .iter()
                .map(|(name, poses)| Sequence {
                    name: name.to_string(),
                    poses: poses.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl PoseLibrary {
    /// Build the library from the built in poses plus extra ones.
    ///
    /// Extra poses and sequences replace built in ones of the same name. Every sequence must
    /// only use poses which exist.
    pub fn new(extra_poses: Vec<Pose>, extra_sequences: Vec<Sequence>) -> Result<Self, PoseError> {
        let mut lib = Self::default();

        for pose in extra_poses {
            lib.poses.retain(|p| p.name != pose.name);
            lib.poses.push(pose);
        }

        for seq in extra_sequences {
            lib.sequences.retain(|s| s.name != seq.name);
            lib.sequences.push(seq);
        }

        for seq in lib.sequences.iter() {
            if let Some(missing) = seq.poses.iter().find(|p| lib.pose(p).is_err()) {
                return Err(PoseError::SequenceUsesUnknownPose(
                    seq.name.clone(),
                    missing.clone(),
                ));
            }
        }

        Ok(lib)
    }

    /// Get a pose by name.
    pub fn pose(&self, name: &str) -> Result<&Pose, PoseError> {
        self.poses
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PoseError::UnknownPose(name.to_string(), self.list_poses().join(", ")))
    }

    /// Names of all available poses.
    pub fn list_poses(&self) -> Vec<&str> {
        self.poses.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of all available sequences.
    pub fn list_sequences(&self) -> Vec<&str> {
        self.sequences.iter().map(|s| s.name.as_str()).collect()
    }

    /// Get the poses of a sequence, in order.
    pub fn sequence(&self, name: &str) -> Result<Vec<&Pose>, PoseError> {
        let seq = self
            .sequences
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                PoseError::UnknownSequence(name.to_string(), self.list_sequences().join(", "))
            })?;

        seq.poses.iter().map(|p| self.pose(p)).collect()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builtin() {
        let lib = PoseLibrary::default();

        assert_eq!(lib.list_poses().len(), 9);
        assert_eq!(lib.pose("grip").unwrap().gripper, 90);
        assert_eq!(lib.pose("fold_end").unwrap().angle_deg(JointId::Wrist), 135);
        assert!(matches!(lib.pose("dance"), Err(PoseError::UnknownPose(..))));

        let towel = lib.sequence("towel_fold").unwrap();
        assert_eq!(towel.len(), 9);
        assert_eq!(towel[0].name, "home");
        assert_eq!(towel[8].name, "home");

        assert_eq!(lib.sequence("shirt_fold").unwrap()[5].name, "rest");
        assert!(lib.sequence("sock_fold").is_err());
    }

    #[test]
    fn test_extra_poses() {
        let lib = PoseLibrary::new(
            vec![
                Pose::new("wave", [30, 90, 90, 90, 10]),
                Pose::new("home", [90, 90, 90, 90, 20]),
            ],
            vec![Sequence {
                name: "greet".into(),
                poses: vec!["home".into(), "wave".into(), "home".into()],
            }],
        )
        .unwrap();

        assert_eq!(lib.list_poses().len(), 10);
        assert_eq!(lib.pose("home").unwrap().gripper, 20);
        assert_eq!(lib.sequence("greet").unwrap()[1].base, 30);

        let bad = PoseLibrary::new(
            vec![],
            vec![Sequence {
                name: "broken".into(),
                poses: vec!["home".into(), "jump".into()],
            }],
        );
        assert_eq!(
            bad.unwrap_err(),
            PoseError::SequenceUsesUnknownPose("broken".into(), "jump".into())
        );
    }

    #[test]
    fn test_with_joint() {
        let home = Pose::new("home", [90, 90, 90, 90, 10]);
        let moved = home.with_joint("manual", JointId::Elbow, 45);

        assert_eq!(moved.elbow, 45);
        assert_eq!(moved.base, 90);
        assert_eq!(moved.name, "manual");
        assert_eq!(
            moved.to_string(),
            "Pose(manual): base=90, shoulder=90, elbow=45, wrist=90, gripper=10"
        );
    }
}
