//! Implementations for the TeleopCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::{rescale, to_angle_deg, Params, TeleopCtrlError};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Teleoperation control module state
#[derive(Default)]
pub struct TeleopCtrl {
    params: Params,

    initialised: bool,

    /// Output of the exponential filter, `None` until the first reading seeds it.
    filtered: Option<f64>,

    /// The last angle sent to the servo.
    last_written_deg: Option<i32>,
}

/// Input data to Teleoperation Control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Raw ADC reading of the operator's input, in `[0, 1023]`.
    pub raw: u16,
}

/// Status report for TeleopCtrl processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub raw: u16,

    /// Reading after clamping and rescaling.
    pub rescaled: f64,

    pub filtered: f64,

    pub angle_deg: i32,

    /// True if the angle was output this cycle.
    pub written: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TeleopCtrl {
    type InitData = Params;
    type InitError = TeleopCtrlError;

    type InputData = InputData;
    /// The angle to write to the servo, or `None` if it is within the deadband of the last one.
    type OutputData = Option<i32>;
    type StatusReport = StatusReport;
    type ProcError = TeleopCtrlError;

    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.validate()?;

        self.params = init_data;
        self.filtered = None;
        self.last_written_deg = None;
        self.initialised = true;

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !self.initialised {
            return Err(TeleopCtrlError::NotInitialised);
        }

        let rescaled = rescale(input_data.raw, &self.params);

        // The first reading seeds the filter
        let alpha = self.params.alpha;
        let filtered = match self.filtered {
            Some(prev) => alpha * prev + (1.0 - alpha) * rescaled,
            None => rescaled,
        };
        self.filtered = Some(filtered);

        let angle_deg = to_angle_deg(filtered);

        let output = match self.last_written_deg {
            Some(last) if (angle_deg - last).abs() < self.params.deadband_deg => None,
            _ => {
                debug!("Servo -> {} deg", angle_deg);
                self.last_written_deg = Some(angle_deg);
                Some(angle_deg)
            }
        };

        Ok((
            output,
            StatusReport {
                raw: input_data.raw,
                rescaled,
                filtered,
                angle_deg,
                written: output.is_some(),
            },
        ))
    }
}

impl TeleopCtrl {
    /// The last angle output, `None` before the first cycle.
    pub fn last_written_deg(&self) -> Option<i32> {
        self.last_written_deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
