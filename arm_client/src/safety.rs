//! # Safety checker
//!
//! Validates poses and the transitions between them before they are sent to the arm. A pose must
//! keep every joint within its limits and stay out of the known collision zones, and no joint may
//! move further than the maximum change in one transition.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{JointId, ARM_JOINTS};
use log::warn;
use serde::{Deserialize, Serialize};
use util::maths::norm;

use crate::poses::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the safety checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyParams {
    pub base: Limits,
    pub shoulder: Limits,
    pub elbow: Limits,
    pub wrist: Limits,

    /// The gripper's min is its open angle and its max its closed angle.
    pub gripper: Limits,

    /// Maximum change of any single joint (gripper excluded) in one transition.
    ///
    /// Units: degrees
    pub max_joint_change_deg: i32,

    /// Shoulder and elbow combinations in which the arm would hit its base.
    pub collision_zones: Vec<CollisionZone>,

    /// Link lengths used for the reach estimate, arbitrary units.
    pub links: LinkLengths,
}

/// Inclusive angle limits of a joint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Limits {
    pub min_deg: i32,
    pub max_deg: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionZone {
    pub shoulder_min_deg: i32,
    pub shoulder_max_deg: i32,
    pub elbow_min_deg: i32,
    pub elbow_max_deg: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkLengths {
    pub shoulder: f64,
    pub elbow: f64,
    pub wrist: f64,
}

/// Counts of rejected poses since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SafetyStats {
    pub collision_count: usize,
    pub safety_violation_count: usize,
}

pub struct SafetyChecker {
    params: SafetyParams,

    stats: SafetyStats,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SafetyError {
    #[error("{joint} angle {angle_deg} of pose {pose} is out of range [{min_deg}, {max_deg}]")]
    OutOfRange {
        pose: String,
        joint: JointId,
        angle_deg: i32,
        min_deg: i32,
        max_deg: i32,
    },

    #[error("Pose {0} is in a collision zone")]
    Collision(String),

    #[error("Transition from {from} to {to} moves the {joint} by {change_deg} deg, more than the {max_deg} deg allowed")]
    UnsafeTransition {
        from: String,
        to: String,
        joint: JointId,
        change_deg: i32,
        max_deg: i32,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SafetyParams {
    fn default() -> Self {
        let limits = |min_deg, max_deg| Limits { min_deg, max_deg };

        Self {
            base: limits(0, 180),
            shoulder: limits(15, 165),
            elbow: limits(0, 180),
            wrist: limits(0, 180),
            gripper: limits(10, 90),
            max_joint_change_deg: 90,
            collision_zones: vec![CollisionZone {
                shoulder_min_deg: 15,
                shoulder_max_deg: 40,
                elbow_min_deg: 0,
                elbow_max_deg: 30,
            }],
            links: LinkLengths {
                shoulder: 10.0,
                elbow: 8.0,
                wrist: 5.0,
            },
        }
    }
}

impl SafetyParams {
    pub fn limits(&self, joint: JointId) -> Limits {
        match joint {
            JointId::Base => self.base,
            JointId::Shoulder => self.shoulder,
            JointId::Elbow => self.elbow,
            JointId::Wrist => self.wrist,
            JointId::Gripper => self.gripper,
        }
    }
}

impl Limits {
    pub fn contains(&self, angle_deg: i32) -> bool {
        self.min_deg <= angle_deg && angle_deg <= self.max_deg
    }
}

impl CollisionZone {
    pub fn contains(&self, pose: &Pose) -> bool {
        self.shoulder_min_deg <= pose.shoulder
            && pose.shoulder <= self.shoulder_max_deg
            && self.elbow_min_deg <= pose.elbow
            && pose.elbow <= self.elbow_max_deg
    }
}

impl SafetyChecker {
    pub fn new(params: SafetyParams) -> Self {
        Self {
            params,
            stats: SafetyStats::default(),
        }
    }

    /// Check a pose keeps all joints in their limits and avoids the collision zones.
    ///
    /// Each rejection is counted in the stats.
    pub fn check_pose(&mut self, pose: &Pose) -> Result<(), SafetyError> {
        for joint in ARM_JOINTS.iter() {
            let limits = self.params.limits(*joint);
            let angle_deg = pose.angle_deg(*joint);

            if !limits.contains(angle_deg) {
                self.stats.safety_violation_count += 1;

                let e = SafetyError::OutOfRange {
                    pose: pose.name.clone(),
                    joint: *joint,
                    angle_deg,
                    min_deg: limits.min_deg,
                    max_deg: limits.max_deg,
                };
                warn!("Safety violation: {}", e);
                return Err(e);
            }
        }

        if self.is_in_collision_zone(pose) {
            self.stats.collision_count += 1;

            let e = SafetyError::Collision(pose.name.clone());
            warn!("Safety violation: {}", e);
            return Err(e);
        }

        Ok(())
    }

    pub fn is_in_collision_zone(&self, pose: &Pose) -> bool {
        self.params.collision_zones.iter().any(|z| z.contains(pose))
    }

    /// Check no joint moves further than the maximum change between the two poses.
    ///
    /// The gripper isn't checked, it can always move between open and closed.
    pub fn check_transition(&self, from: &Pose, to: &Pose) -> Result<(), SafetyError> {
        for joint in ARM_JOINTS.iter().filter(|j| **j != JointId::Gripper) {
            let change_deg = (to.angle_deg(*joint) - from.angle_deg(*joint)).abs();

            if change_deg > self.params.max_joint_change_deg {
                let e = SafetyError::UnsafeTransition {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    joint: *joint,
                    change_deg,
                    max_deg: self.params.max_joint_change_deg,
                };
                warn!("{}", e);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Approximate distance from the base to the end of the arm in the shoulder plane.
    pub fn reach(&self, pose: &Pose) -> f64 {
        let links = &self.params.links;
        let shoulder_rad = (pose.shoulder as f64).to_radians();
        let elbow_rad = (pose.elbow as f64).to_radians();

        let x = links.shoulder * shoulder_rad.cos()
            + links.elbow * (shoulder_rad + elbow_rad).cos()
            + links.wrist;
        let y = links.shoulder * shoulder_rad.sin() + links.elbow * (shoulder_rad + elbow_rad).sin();

        norm(&[x, y], &[0.0, 0.0]).unwrap_or(0.0)
    }

    pub fn params(&self) -> &SafetyParams {
        &self.params
    }

    pub fn stats(&self) -> SafetyStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SafetyStats::default();
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
