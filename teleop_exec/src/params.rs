//! # Teleoperation Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::serial::SerialParams;
use serde::Deserialize;
use servo_ctrl::{DriverKind, PulseParams};

use crate::{analog::SourceKind, teleop_ctrl};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct TeleopExecParams {
    /// Minimum level of log records, one of `info`, `debug` or `trace`
    pub log_level: String,

    /// Period of the control loop.
    ///
    /// Units: milliseconds
    pub tick_period_ms: u64,

    /// The servo driver to use
    pub driver: DriverKind,

    /// Driver channel of the teleoperated servo
    pub channel: u8,

    /// Pulse timing of the servo
    pub servo: PulseParams,

    /// Where raw readings come from
    pub source: SourceKind,

    /// Serial port the readings arrive on, used by the serial source
    pub serial: SerialParams,

    /// ADC counts the simulated source moves per tick
    #[serde(default = "default_sim_step")]
    pub sim_step: u16,

    /// Parameters of the teleoperation control module
    pub teleop_ctrl: teleop_ctrl::Params,
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_sim_step() -> u16 {
    4
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() {
        let params: TeleopExecParams = util::params::from_str(include_str!(
            "../../params/teleop_exec.toml"
        ))
        .unwrap();

        assert_eq!(params.tick_period_ms, 10);
        assert_eq!(params.source, SourceKind::Sim);
        assert_eq!(params.sim_step, 4);
        assert!(params.servo.validate().is_ok());
        assert!(params.teleop_ctrl.validate().is_ok());
    }
}
