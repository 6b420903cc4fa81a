//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{JointId, ARM_JOINTS, NUM_JOINTS};
use serde::{Deserialize, Serialize};
use servo_ctrl::{SERVO_MAX_ANGLE_DEG, SERVO_MIN_ANGLE_DEG};

use super::ArmCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Time between two steps of a joint ramp. Each step moves a joint by one degree, so this sets
    /// the speed of the arm.
    ///
    /// Units: milliseconds
    pub step_period_ms: u64,

    /// Maximum number of single joint moves which may be waiting behind the current one.
    pub max_queued_moves: usize,

    /// Angle the gripper moves to on the close command. The open angle is the gripper's home
    /// angle.
    ///
    /// Units: degrees
    pub gripper_closed_deg: i32,

    /// Per joint configuration.
    pub joints: JointTable,
}

/// Configuration of every joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointTable {
    pub base: JointParams,
    pub shoulder: JointParams,
    pub elbow: JointParams,
    pub wrist: JointParams,
    pub gripper: JointParams,
}

/// Configuration of a single joint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointParams {
    /// Servo driver channel the joint is connected to.
    pub channel: u8,

    /// Lowest angle the joint may be moved to.
    ///
    /// Units: degrees
    pub min_deg: i32,

    /// Highest angle the joint may be moved to.
    ///
    /// Units: degrees
    pub max_deg: i32,

    /// Angle the joint starts at and returns to when homed. For the gripper this is the open
    /// angle.
    ///
    /// Units: degrees
    pub home_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        let joint = |channel, min_deg, max_deg, home_deg| JointParams {
            channel,
            min_deg,
            max_deg,
            home_deg,
        };

        Self {
            step_period_ms: 15,
            max_queued_moves: 32,
            gripper_closed_deg: 90,
            joints: JointTable {
                base: joint(0, 0, 180, 90),
                shoulder: joint(1, 15, 165, 90),
                elbow: joint(2, 0, 180, 90),
                wrist: joint(3, 0, 180, 90),
                gripper: joint(4, 10, 90, 10),
            },
        }
    }
}

impl Params {
    /// Check the parameters describe an arm which can be safely driven.
    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        if self.step_period_ms == 0 {
            return Err(ArmCtrlError::InvalidParams(
                "step_period_ms must be greater than zero".into(),
            ));
        }

        // Homing queues one move per joint
        if self.max_queued_moves < NUM_JOINTS {
            return Err(ArmCtrlError::InvalidParams(format!(
                "max_queued_moves must be at least {}",
                NUM_JOINTS
            )));
        }

        let mut channels = Vec::with_capacity(NUM_JOINTS);

        for id in ARM_JOINTS.iter() {
            let j = self.joints.get(*id);

            if j.min_deg < SERVO_MIN_ANGLE_DEG
                || j.max_deg > SERVO_MAX_ANGLE_DEG
                || j.min_deg > j.max_deg
            {
                return Err(ArmCtrlError::InvalidParams(format!(
                    "{} bounds [{}, {}] must be ordered and within [{}, {}]",
                    id, j.min_deg, j.max_deg, SERVO_MIN_ANGLE_DEG, SERVO_MAX_ANGLE_DEG
                )));
            }

            if !j.contains(j.home_deg) {
                return Err(ArmCtrlError::InvalidParams(format!(
                    "{} home angle {} is outside its bounds [{}, {}]",
                    id, j.home_deg, j.min_deg, j.max_deg
                )));
            }

            if channels.contains(&j.channel) {
                return Err(ArmCtrlError::InvalidParams(format!(
                    "{} uses channel {} which is already in use",
                    id, j.channel
                )));
            }
            channels.push(j.channel);
        }

        if !self.joints.gripper.contains(self.gripper_closed_deg) {
            return Err(ArmCtrlError::InvalidParams(format!(
                "gripper closed angle {} is outside its bounds [{}, {}]",
                self.gripper_closed_deg, self.joints.gripper.min_deg, self.joints.gripper.max_deg
            )));
        }

        Ok(())
    }
}

impl JointTable {
    /// Get the parameters of a joint.
    pub fn get(&self, id: JointId) -> &JointParams {
        match id {
            JointId::Base => &self.base,
            JointId::Shoulder => &self.shoulder,
            JointId::Elbow => &self.elbow,
            JointId::Wrist => &self.wrist,
            JointId::Gripper => &self.gripper,
        }
    }
}

impl JointParams {
    /// True if the angle is within the joint's bounds.
    pub fn contains(&self, angle_deg: i32) -> bool {
        self.min_deg <= angle_deg && angle_deg <= self.max_deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_params() {
        let mut p = Params::default();
        p.joints.shoulder.home_deg = 170;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.joints.wrist.channel = p.joints.base.channel;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.joints.elbow.max_deg = 200;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.gripper_closed_deg = 120;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.max_queued_moves = 2;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let p: Params = util::params::from_str(
            r#"
            step_period_ms = 15
            max_queued_moves = 16
            gripper_closed_deg = 80

            [joints]
            base = { channel = 0, min_deg = 0, max_deg = 180, home_deg = 90 }
            shoulder = { channel = 1, min_deg = 15, max_deg = 165, home_deg = 90 }
            elbow = { channel = 2, min_deg = 0, max_deg = 180, home_deg = 90 }
            wrist = { channel = 3, min_deg = 0, max_deg = 180, home_deg = 90 }
            gripper = { channel = 4, min_deg = 10, max_deg = 90, home_deg = 10 }
            "#,
        )
        .unwrap();

        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.joints.get(JointId::Shoulder).min_deg, 15);
        assert_eq!(p.gripper_closed_deg, 80);
    }
}
