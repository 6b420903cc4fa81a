//! # Servo Controller Crate
//!
//! This crate provides a unified servo control interface which can abstract over different types
//! of servo driver boards. Hobby servos are positioned by the width of a pulse repeated at a fixed
//! frequency, so [`ServoCtrl`] converts angles in degrees into duty cycles which are then applied
//! by a [`ServoDriver`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

/// Simulated [`ServoDriver`] which records and logs the demanded duty cycles.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use util::maths::lin_map;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Minimum angle a positional servo can be commanded to.
pub const SERVO_MIN_ANGLE_DEG: i32 = 0;

/// Maximum angle a positional servo can be commanded to.
pub const SERVO_MAX_ANGLE_DEG: i32 = 180;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {

    /// Set the duty cycle of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel index to set the duty cycle for
    /// - `duty_cycle` - The duty cycle to set. Must be a value between 0.0 and 1.0. Values outside
    ///   this range will be rejected.
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pulse timing of the servos attached to a driver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct PulseParams {
    /// Frequency of the PWM signal.
    ///
    /// Units: hertz
    pub pwm_freq_hz: f64,

    /// Pulse width corresponding to 0 degrees.
    ///
    /// Units: microseconds
    pub min_pulse_us: f64,

    /// Pulse width corresponding to 180 degrees.
    ///
    /// Units: microseconds
    pub max_pulse_us: f64,
}

/// Positions servos by angle on top of a [`ServoDriver`].
pub struct ServoCtrl<D>
where
    D: ServoDriver
{
    driver: D,

    pulse: PulseParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Duty cycle must be between 0.0 and 1.0")]
    InvalidDutyCycle,

    #[error("Channel {0} does not exist on the driver")]
    InvalidChannel(u8),

    #[error("Angle {0} is outside the servo range [0, 180]")]
    InvalidAngle(i32),

    #[error("Invalid pulse parameters: {0}")]
    InvalidPulseParams(String),

    #[error("The servo driver could not be opened: {0}")]
    DriverUnavailable(String),
}

/// The kinds of [`ServoDriver`] which can be selected in parameter files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// [`sim::SimServoDriver`]
    Sim,

    /// PCA9685 board on the Raspberry Pi's I2C bus
    Pca9685,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open the driver of the given kind.
///
/// Hardware drivers are only available on the Raspberry Pi, on any other target requesting one
/// gives [`ServoError::DriverUnavailable`].
pub fn open_driver(
    kind: DriverKind,
    pulse: &PulseParams
) -> Result<Box<dyn ServoDriver>, ServoError> {
    match kind {
        DriverKind::Sim => Ok(Box::new(sim::SimServoDriver::new())),
        DriverKind::Pca9685 => open_pca9685(pulse.pwm_freq_hz),
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<D> ServoDriver for Box<D>
where
    D: ServoDriver + ?Sized
{
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), ServoError> {
        (**self).set_duty_cycle(channel, duty_cycle)
    }
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            pwm_freq_hz: 50.0,
            min_pulse_us: 500.0,
            max_pulse_us: 2500.0,
        }
    }
}

impl PulseParams {
    /// Check the pulses fit inside the PWM period.
    pub fn validate(&self) -> Result<(), ServoError> {
        if !(self.pwm_freq_hz > 0.0) {
            return Err(ServoError::InvalidPulseParams(format!(
                "PWM frequency must be positive, got {}", self.pwm_freq_hz
            )))
        }

        let period_us = 1e6 / self.pwm_freq_hz;

        if !(self.min_pulse_us > 0.0)
            || self.min_pulse_us >= self.max_pulse_us
            || self.max_pulse_us > period_us
        {
            return Err(ServoError::InvalidPulseParams(format!(
                "Expected 0 < min_pulse_us < max_pulse_us <= {} us, got [{}, {}]",
                period_us, self.min_pulse_us, self.max_pulse_us
            )))
        }

        Ok(())
    }

    /// Duty cycle which positions a servo at the given angle.
    pub fn duty_cycle(&self, angle_deg: i32) -> Result<f64, ServoError> {
        if angle_deg < SERVO_MIN_ANGLE_DEG || angle_deg > SERVO_MAX_ANGLE_DEG {
            return Err(ServoError::InvalidAngle(angle_deg))
        }

        let pulse_us = lin_map(
            (SERVO_MIN_ANGLE_DEG as f64, SERVO_MAX_ANGLE_DEG as f64),
            (self.min_pulse_us, self.max_pulse_us),
            angle_deg as f64
        );

        Ok(pulse_us * self.pwm_freq_hz / 1e6)
    }
}

impl<D> ServoCtrl<D>
where
    D: ServoDriver
{
    /// Create a new servo controller.
    ///
    /// ## Arguments
    /// - `driver` - An initialised [`ServoDriver`] board
    /// - `pulse` - Pulse timing of the attached servos
    pub fn new(driver: D, pulse: PulseParams) -> Result<Self, ServoError> {
        pulse.validate()?;

        Ok(Self {
            driver,
            pulse
        })
    }

    /// Position the servo on the given channel at an angle.
    pub fn set_angle(&mut self, channel: u8, angle_deg: i32) -> Result<(), ServoError> {
        let duty_cycle = self.pulse.duty_cycle(angle_deg)?;

        trace!("Channel {} -> {} deg (duty {:.4})", channel, angle_deg, duty_cycle);

        self.driver.set_duty_cycle(channel, duty_cycle)
    }

    /// Get a reference to the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn open_pca9685(pwm_freq_hz: f64) -> Result<Box<dyn ServoDriver>, ServoError> {
    let i2c = rppal::i2c::I2c::new()
        .map_err(|e| ServoError::DriverUnavailable(e.to_string()))?;

    Ok(Box::new(pca9685::init(i2c, pwm_freq_hz)?))
}

#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
fn open_pca9685(_pwm_freq_hz: f64) -> Result<Box<dyn ServoDriver>, ServoError> {
    Err(ServoError::DriverUnavailable(
        "the PCA9685 driver is only available on the Raspberry Pi".into()
    ))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimServoDriver;

    #[test]
    fn test_duty_cycle() {
        let p = PulseParams::default();

        // 50 Hz is a 20 ms period
        assert_eq!(p.duty_cycle(0), Ok(0.025));
        assert_eq!(p.duty_cycle(90), Ok(0.075));
        assert_eq!(p.duty_cycle(180), Ok(0.125));
        assert_eq!(p.duty_cycle(181), Err(ServoError::InvalidAngle(181)));
        assert_eq!(p.duty_cycle(-1), Err(ServoError::InvalidAngle(-1)));
    }

    #[test]
    fn test_validate() {
        assert!(PulseParams::default().validate().is_ok());

        let backwards = PulseParams {
            min_pulse_us: 2500.0,
            max_pulse_us: 500.0,
            ..Default::default()
        };
        assert!(backwards.validate().is_err());

        let too_long = PulseParams {
            pwm_freq_hz: 500.0,
            ..Default::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_set_angle() {
        let mut ctrl = ServoCtrl::new(SimServoDriver::new(), PulseParams::default()).unwrap();

        ctrl.set_angle(3, 90).unwrap();
        assert_eq!(ctrl.driver().last_duty(3), Some(0.075));
        assert_eq!(ctrl.driver().num_writes(), 1);

        // Rejected angles never reach the driver
        assert!(ctrl.set_angle(3, 200).is_err());
        assert_eq!(ctrl.driver().num_writes(), 1);

        assert_eq!(ctrl.set_angle(16, 90), Err(ServoError::InvalidChannel(16)));
    }

    #[test]
    fn test_open_sim_driver() {
        let driver = open_driver(DriverKind::Sim, &PulseParams::default()).unwrap();
        let mut ctrl = ServoCtrl::new(driver, PulseParams::default()).unwrap();

        assert!(ctrl.set_angle(0, 45).is_ok());
        assert_eq!(ctrl.set_angle(0, -5), Err(ServoError::InvalidAngle(-5)));
    }
}
