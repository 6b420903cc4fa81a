//! Joint actuators and their motion ramps

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointId;
use serde::Serialize;

use super::{ArmCtrlError, JointParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single joint of the arm.
///
/// The angle of an actuator is always within its bounds: targets are checked before a [`Ramp`]
/// is created, and the angle is only changed by stepping a ramp.
#[derive(Debug, Clone, Serialize)]
pub struct Actuator {
    id: JointId,

    channel: u8,

    angle_deg: i32,

    min_deg: i32,

    max_deg: i32,
}

/// Constant speed motion profile between two angles.
///
/// Yields every intermediate angle, one degree apart, ending with the target. A ramp whose start
/// equals its target yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    current_deg: i32,

    target_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Actuator {
    /// Create a new actuator sitting at its home angle.
    pub fn new(id: JointId, params: &JointParams) -> Self {
        Self {
            id,
            channel: params.channel,
            angle_deg: params.home_deg,
            min_deg: params.min_deg,
            max_deg: params.max_deg,
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// The last angle demanded of the actuator.
    pub fn angle_deg(&self) -> i32 {
        self.angle_deg
    }

    /// The `(min, max)` bounds of the actuator.
    pub fn bounds_deg(&self) -> (i32, i32) {
        (self.min_deg, self.max_deg)
    }

    /// Check that a target angle is within the actuator's bounds.
    pub fn check_target(&self, target_deg: i32) -> Result<(), ArmCtrlError> {
        if target_deg < self.min_deg || target_deg > self.max_deg {
            return Err(ArmCtrlError::OutOfRange {
                joint: self.id,
                angle_deg: target_deg,
                min_deg: self.min_deg,
                max_deg: self.max_deg,
            });
        }

        Ok(())
    }

    /// Create the ramp which moves this actuator from its current angle to the target.
    pub fn ramp_to(&self, target_deg: i32) -> Result<Ramp, ArmCtrlError> {
        self.check_target(target_deg)?;

        Ok(Ramp {
            current_deg: self.angle_deg,
            target_deg,
        })
    }

    /// Advance the ramp by one step, recording the new angle.
    ///
    /// Returns the angle which must be written to the servo, or `None` if the ramp is done.
    pub fn step(&mut self, ramp: &mut Ramp) -> Option<i32> {
        let angle_deg = ramp.next()?;

        debug_assert!(self.min_deg <= angle_deg && angle_deg <= self.max_deg);

        self.angle_deg = angle_deg;
        Some(angle_deg)
    }
}

impl Ramp {
    pub fn target_deg(&self) -> i32 {
        self.target_deg
    }

    /// True once the target has been reached.
    pub fn is_done(&self) -> bool {
        self.current_deg == self.target_deg
    }
}

impl Iterator for Ramp {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.is_done() {
            return None;
        }

        self.current_deg += (self.target_deg - self.current_deg).signum();
        Some(self.current_deg)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.target_deg - self.current_deg).abs() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Ramp {}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn shoulder() -> Actuator {
        Actuator::new(
            JointId::Shoulder,
            &JointParams {
                channel: 1,
                min_deg: 15,
                max_deg: 165,
                home_deg: 90,
            },
        )
    }

    #[test]
    fn test_ramp_is_monotonic() {
        let act = shoulder();

        let up: Vec<i32> = act.ramp_to(95).unwrap().collect();
        assert_eq!(up, vec![91, 92, 93, 94, 95]);

        let down: Vec<i32> = act.ramp_to(86).unwrap().collect();
        assert_eq!(down, vec![89, 88, 87, 86]);

        let ramp = act.ramp_to(15).unwrap();
        assert_eq!(ramp.len(), 75);
        let angles: Vec<i32> = ramp.collect();
        assert!(angles.windows(2).all(|w| w[1] == w[0] - 1));
        assert_eq!(angles.last(), Some(&15));
    }

    #[test]
    fn test_ramp_to_current_is_empty() {
        let act = shoulder();
        let mut ramp = act.ramp_to(90).unwrap();

        assert!(ramp.is_done());
        assert_eq!(ramp.next(), None);
    }

    #[test]
    fn test_out_of_range_target() {
        let act = shoulder();

        assert_eq!(
            act.ramp_to(10),
            Err(ArmCtrlError::OutOfRange {
                joint: JointId::Shoulder,
                angle_deg: 10,
                min_deg: 15,
                max_deg: 165
            })
        );
        assert!(act.ramp_to(166).is_err());
        assert!(act.ramp_to(165).is_ok());
        assert_eq!(act.angle_deg(), 90);
    }

    #[test]
    fn test_step_updates_angle() {
        let mut act = shoulder();
        let mut ramp = act.ramp_to(92).unwrap();

        assert_eq!(act.step(&mut ramp), Some(91));
        assert_eq!(act.angle_deg(), 91);
        assert!(!ramp.is_done());
        assert_eq!(act.step(&mut ramp), Some(92));
        assert!(ramp.is_done());
        assert_eq!(act.step(&mut ramp), None);
        assert_eq!(act.angle_deg(), 92);
    }
}
