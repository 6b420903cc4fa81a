//! # Analog sources
//!
//! Sources of the raw readings fed into teleoperation control. Readings are 10 bit ADC values in
//! `[0, 1023]`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io::Read;

use comms_if::serial::{self, LineBuffer, SerialLinkError};
use log::{trace, warn};
use serde::Deserialize;

use crate::teleop_ctrl::ADC_MAX;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something that can be sampled for a raw analog reading.
pub trait AnalogSource {
    /// Get the latest reading.
    ///
    /// Returns `None` if no reading has ever been made.
    fn sample(&mut self) -> Result<Option<u16>, AnalogError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Readings sent by a microcontroller over a serial port, one ASCII decimal value per line.
///
/// The newest complete reading wins. If nothing arrives between two samples the previous reading
/// is held.
pub struct SerialAnalogSource<P> {
    port: P,

    lines: LineBuffer,

    last: Option<u16>,
}

/// Deterministic source which sweeps up and down the whole ADC range.
#[derive(Debug, Clone)]
pub struct SimAnalogSource {
    value: u16,

    step: u16,

    rising: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The kinds of [`AnalogSource`] which can be selected in parameter files.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Serial,
    Sim,
}

#[derive(thiserror::Error, Debug)]
pub enum AnalogError {
    #[error("Could not read from the analog source: {0}")]
    SerialError(#[from] SerialLinkError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P> SerialAnalogSource<P>
where
    P: Read,
{
    pub fn new(port: P) -> Self {
        Self {
            port,
            lines: LineBuffer::new(),
            last: None,
        }
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

impl<P> AnalogSource for SerialAnalogSource<P>
where
    P: Read,
{
    fn sample(&mut self) -> Result<Option<u16>, AnalogError> {
        let bytes = serial::read_available(&mut self.port)?;

        for line in self.lines.push(&bytes) {
            match line.parse::<u16>() {
                Ok(v) if v <= ADC_MAX => {
                    trace!("Analog reading {}", v);
                    self.last = Some(v);
                }
                _ => warn!("Rejected analog reading {:?}", line),
            }
        }

        Ok(self.last)
    }
}

impl SimAnalogSource {
    /// Create a source starting at zero, moving `step` counts per sample.
    pub fn new(step: u16) -> Self {
        Self {
            value: 0,
            step: step.max(1),
            rising: true,
        }
    }
}

impl AnalogSource for SimAnalogSource {
    fn sample(&mut self) -> Result<Option<u16>, AnalogError> {
        let value = self.value;

        if self.rising {
            self.value = (self.value + self.step).min(ADC_MAX);
            if self.value == ADC_MAX {
                self.rising = false;
            }
        } else {
            self.value = self.value.saturating_sub(self.step);
            if self.value == 0 {
                self.rising = true;
            }
        }

        Ok(Some(value))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
