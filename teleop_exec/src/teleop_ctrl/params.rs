//! Parameters structure for TeleopCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{TeleopCtrlError, ADC_MAX};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Teleoperation control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Lowest reading the potentiometer actually reaches. Lower readings are clamped to this.
    pub raw_min: u16,

    /// Highest reading the potentiometer actually reaches. Higher readings are clamped to this.
    pub raw_max: u16,

    /// Smoothing factor of the exponential filter, the weight given to the previous filtered
    /// value. Must be in `[0, 1)`, 0 disables the filter.
    pub alpha: f64,

    /// Minimum change from the last written angle before a new angle is written.
    ///
    /// Units: degrees
    pub deadband_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            raw_min: 0,
            raw_max: ADC_MAX,
            alpha: 0.8,
            deadband_deg: 1,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), TeleopCtrlError> {
        if self.raw_min >= self.raw_max || self.raw_max > ADC_MAX {
            return Err(TeleopCtrlError::InvalidParams(format!(
                "Expected 0 <= raw_min < raw_max <= {}, got [{}, {}]",
                ADC_MAX, self.raw_min, self.raw_max
            )));
        }

        if !(0.0..1.0).contains(&self.alpha) {
            return Err(TeleopCtrlError::InvalidParams(format!(
                "alpha must be in [0, 1), got {}",
                self.alpha
            )));
        }

        if self.deadband_deg < 1 {
            return Err(TeleopCtrlError::InvalidParams(format!(
                "deadband_deg must be at least 1, got {}",
                self.deadband_deg
            )));
        }

        Ok(())
    }
}
