//! Teleoperation control module
//!
//! Turns the raw readings of an analog input (usually a joystick potentiometer) into a smooth
//! servo angle. Each reading is clamped to the travel the potentiometer actually reaches, rescaled
//! back onto the full ADC range, low pass filtered and mapped onto the servo's range. New angles
//! are only written once they have moved by at least the deadband.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use servo_ctrl::{SERVO_MAX_ANGLE_DEG, SERVO_MIN_ANGLE_DEG};
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest reading the 10 bit ADC can produce.
pub const ADC_MAX: u16 = 1023;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TeleopCtrl operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TeleopCtrlError {
    #[error("TeleopCtrl has not been initialised")]
    NotInitialised,

    #[error("Invalid TeleopCtrl parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a raw reading into `[raw_min, raw_max]` and stretch that range back over the full ADC
/// range.
pub fn rescale(raw: u16, params: &Params) -> f64 {
    let clamped = clamp(raw, params.raw_min, params.raw_max);

    lin_map(
        (params.raw_min as f64, params.raw_max as f64),
        (0.0, ADC_MAX as f64),
        clamped as f64,
    )
}

/// Map a filtered reading onto the servo range, rounding to the nearest degree.
pub fn to_angle_deg(filtered: f64) -> i32 {
    let angle = lin_map(
        (0.0, ADC_MAX as f64),
        (SERVO_MIN_ANGLE_DEG as f64, SERVO_MAX_ANGLE_DEG as f64),
        filtered,
    )
    .round() as i32;

    clamp(angle, SERVO_MIN_ANGLE_DEG, SERVO_MAX_ANGLE_DEG)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
