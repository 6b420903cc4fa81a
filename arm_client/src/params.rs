//! # Arm Client Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::serial::SerialParams;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    arm::Timeouts,
    poses::{Pose, Sequence},
    safety::SafetyParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct ArmClientParams {
    /// Minimum level of log records, one of `info`, `debug` or `trace`
    pub log_level: String,

    /// Command history file, relative to the software root
    pub history_file: String,

    /// Maximum time to wait for a move to complete.
    ///
    /// Units: milliseconds
    pub response_timeout_ms: u64,

    /// Time without a response after which a raw exchange is finished.
    ///
    /// Units: milliseconds
    pub quiet_period_ms: u64,

    /// Time to wait for the controller to report it's ready after connecting.
    ///
    /// Units: milliseconds
    pub ready_timeout_ms: u64,

    /// Pause between the poses of a sequence.
    ///
    /// Units: milliseconds
    pub sequence_settle_ms: u64,

    /// Serial port the controller is connected to
    pub serial: SerialParams,

    #[serde(default)]
    pub safety: SafetyParams,

    /// Poses added to, or replacing, the built in ones
    #[serde(default)]
    pub poses: Vec<Pose>,

    /// Sequences added to, or replacing, the built in ones
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmClientParams {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            response: Duration::from_millis(self.response_timeout_ms),
            quiet: Duration::from_millis(self.quiet_period_ms),
            settle: Duration::from_millis(self.sequence_settle_ms),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::poses::PoseLibrary;

    #[test]
    fn test_params_file() {
        let params: ArmClientParams = util::params::from_str(include_str!(
            "../../params/arm_client.toml"
        ))
        .unwrap();

        assert_eq!(params.serial.baud_rate, 9600);
        assert_eq!(params.timeouts().response, Duration::from_secs(20));
        assert_eq!(params.safety.max_joint_change_deg, 90);
        assert_eq!(params.safety.collision_zones.len(), 1);

        let lib = PoseLibrary::new(params.poses, params.sequences).unwrap();
        assert!(lib.pose("wave").is_ok());
        assert_eq!(lib.sequence("greet").unwrap().len(), 3);
    }

    #[test]
    fn test_safety_defaults() {
        let params: ArmClientParams = util::params::from_str(
            r#"
            log_level = "debug"
            history_file = "arm_client_history.txt"
            response_timeout_ms = 1000
            quiet_period_ms = 100
            ready_timeout_ms = 100
            sequence_settle_ms = 0

            [serial]
            port = "/dev/null"
            baud_rate = 115200
            "#,
        )
        .unwrap();

        assert_eq!(params.safety.shoulder.min_deg, 15);
        assert_eq!(params.serial.read_timeout_ms, 1);
        assert!(params.poses.is_empty());
    }
}
