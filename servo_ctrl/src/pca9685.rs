//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use pwm_pca9685::{Address, Channel, Pca9685};
use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::{ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const MAX_PWM: u16 = 4096;

/// Frequency of the PCA9685's internal oscillator.
const OSC_FREQ_HZ: f64 = 25_000_000.0;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create and enable a PCA9685 at its default address, running at the given PWM frequency.
pub fn init<I2C, E>(i2c: I2C, pwm_freq_hz: f64) -> Result<Pca9685<I2C>, ServoError>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    let mut pwm = Pca9685::new(i2c, Address::default()).map_err(map_error)?;

    pwm.set_prescale(prescale(pwm_freq_hz)).map_err(map_error)?;
    pwm.enable().map_err(map_error)?;

    Ok(pwm)
}

/// Prescale register value giving the closest PWM frequency to the one requested.
pub fn prescale(pwm_freq_hz: f64) -> u8 {
    let value = (OSC_FREQ_HZ / (MAX_PWM as f64 * pwm_freq_hz)).round() - 1.0;

    // The chip can't accept prescales below 3
    value.max(3.0).min(255.0) as u8
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> ServoDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    fn set_duty_cycle(
        &mut self,
        channel: u8,
        duty_cycle: f64
    ) -> Result<(), ServoError> {

        // If the duty cycle is out of range return an error
        if duty_cycle < 0.0 || duty_cycle > 1.0 {
            return Err(ServoError::InvalidDutyCycle)
        }

        let channel = channel_from_index(channel)
            .ok_or(ServoError::InvalidChannel(channel))?;

        // Pulse starts at the beginning of the period and ends at the off count
        let off = ((duty_cycle * (MAX_PWM as f64)).round() as u16).min(MAX_PWM - 1);

        self.set_channel_on_off(channel, 0, off).map_err(map_error)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn map_error<E>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(_) => ServoError::I2c,
        pwm_pca9685::Error::InvalidInputData => ServoError::InvalidDutyCycle
    }
}

fn channel_from_index(index: u8) -> Option<Channel> {
    Some(match index {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return None
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
