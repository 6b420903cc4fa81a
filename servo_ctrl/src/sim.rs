//! Simulated [`ServoDriver`]

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use log::debug;

use super::{ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of channels the simulated board has, matching the PCA9685.
const NUM_CHANNELS: u8 = 16;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A driver which has no hardware behind it.
///
/// Every demand is logged at debug level and the last duty cycle of each channel is kept so it
/// can be inspected.
#[derive(Debug, Default)]
pub struct SimServoDriver {
    duty_cycles: HashMap<u8, f64>,

    num_writes: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last duty cycle written to the channel.
    pub fn last_duty(&self, channel: u8) -> Option<f64> {
        self.duty_cycles.get(&channel).copied()
    }

    /// The number of successful writes made to any channel.
    pub fn num_writes(&self) -> usize {
        self.num_writes
    }
}

impl ServoDriver for SimServoDriver {
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), ServoError> {
        if channel >= NUM_CHANNELS {
            return Err(ServoError::InvalidChannel(channel))
        }

        if duty_cycle < 0.0 || duty_cycle > 1.0 {
            return Err(ServoError::InvalidDutyCycle)
        }

        debug!("[sim] channel {:2} duty {:.4}", channel, duty_cycle);

        self.duty_cycles.insert(channel, duty_cycle);
        self.num_writes += 1;

        Ok(())
    }
}
