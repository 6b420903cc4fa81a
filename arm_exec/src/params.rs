//! # Arm Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::serial::SerialParams;
use serde::Deserialize;
use servo_ctrl::{DriverKind, PulseParams};

use crate::arm_ctrl;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct ArmExecParams {
    /// Minimum level of log records, one of `info`, `debug` or `trace`
    pub log_level: String,

    /// The servo driver to use
    pub driver: DriverKind,

    /// Time after the last received digit at which a joint angle is considered complete.
    ///
    /// Units: milliseconds
    pub int_timeout_ms: u64,

    /// Serial port commands are received on
    pub serial: SerialParams,

    /// Pulse timing of the servos
    pub servo: PulseParams,

    /// Parameters of the arm control module
    pub arm_ctrl: arm_ctrl::Params,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() {
        let params: ArmExecParams = util::params::from_str(include_str!(
            "../../params/arm_exec.toml"
        ))
        .unwrap();

        assert_eq!(params.driver, DriverKind::Sim);
        assert_eq!(params.serial.baud_rate, 9600);
        assert!(params.servo.validate().is_ok());
        assert!(params.arm_ctrl.validate().is_ok());
        assert_eq!(params.arm_ctrl.step_period_ms, 15);
    }
}
