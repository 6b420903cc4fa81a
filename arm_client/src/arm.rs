//! # Robot arm client
//!
//! Drives the arm controller over its serial command protocol. Poses are safety checked before
//! anything is sent, then sent as a manual mode block (one joint command per joint) and the
//! client waits for the controller to report that every joint has reached its target.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::{self, Read, Write},
    thread,
    time::{Duration, Instant},
};

use comms_if::{
    eqpt::{JointId, ARM_JOINTS},
    serial::{self, LineBuffer, SerialLinkError},
    tc::{ArmCmd, ArmResponse},
};
use log::{debug, info, warn};

use crate::{
    poses::Pose,
    safety::{SafetyChecker, SafetyError},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time between two reads of the port while waiting for responses.
const POLL_PERIOD: Duration = Duration::from_millis(5);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Timing of the exchanges with the controller.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Maximum time to wait for a command to complete
    pub response: Duration,

    /// Time without any new line after which a raw exchange is considered finished
    pub quiet: Duration,

    /// Pause between the poses of a sequence
    pub settle: Duration,
}

pub struct RobotArm<P> {
    port: P,

    lines: LineBuffer,

    safety: SafetyChecker,

    /// Pose the arm was last moved to, `None` if unknown
    current_pose: Option<Pose>,

    timeouts: Timeouts,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ArmError {
    #[error("Safety check failed: {0}")]
    Unsafe(#[from] SafetyError),

    #[error("The controller rejected the command: {0}")]
    Rejected(ArmResponse),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error(transparent)]
    Link(#[from] SerialLinkError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P> RobotArm<P>
where
    P: Read + Write,
{
    pub fn new(port: P, safety: SafetyChecker, timeouts: Timeouts) -> Self {
        Self {
            port,
            lines: LineBuffer::new(),
            safety,
            current_pose: None,
            timeouts,
        }
    }

    /// Wait for the controller to report it is ready.
    ///
    /// Returns false if it doesn't within `timeout`, which is expected if the controller was
    /// already running when the client connected.
    pub fn wait_ready(&mut self, timeout: Duration) -> Result<bool, ArmError> {
        let start = Instant::now();

        while start.elapsed() < timeout {
            if self.read_responses()?.contains(&ArmResponse::Ready) {
                info!("Arm controller ready");
                return Ok(true);
            }
            thread::sleep(POLL_PERIOD);
        }

        Ok(false)
    }

    /// Move every joint to the pose.
    ///
    /// The pose, and the transition to it from the current pose, are checked first. Nothing is
    /// sent if either check fails.
    pub fn move_to_pose(&mut self, pose: &Pose) -> Result<(), ArmError> {
        self.safety.check_pose(pose)?;

        if let Some(ref current) = self.current_pose {
            self.safety.check_transition(current, pose)?;
        }

        let mut cmds = vec![ArmCmd::EnterManual];
        cmds.extend(ARM_JOINTS.iter().map(|j| ArmCmd::SetJoint {
            joint: *j,
            angle_deg: Some(pose.angle_deg(*j)),
        }));
        cmds.push(ArmCmd::ExitManual);

        self.send(&cmds)?;

        let mut reached = Vec::new();
        self.wait_for(&format!("pose {}", pose.name), |r| {
            if let ArmResponse::JointReached { joint, .. } = r {
                reached.push(*joint);
            }
            reached.len() == ARM_JOINTS.len()
        })?;

        info!("Moved to pose: {}", pose.name);
        self.current_pose = Some(pose.clone());

        Ok(())
    }

    /// Move a single joint, keeping the others where they are.
    pub fn move_joint(
        &mut self,
        joint: JointId,
        angle_deg: i32,
        home: &Pose,
    ) -> Result<(), ArmError> {
        let from = self.current_pose.clone().unwrap_or_else(|| home.clone());
        let target = from.with_joint("manual", joint, angle_deg);

        self.move_to_pose(&target)
    }

    /// Move through the poses in order, pausing between each. Stops at the first failure.
    pub fn run_sequence(&mut self, poses: &[&Pose]) -> Result<(), ArmError> {
        for (i, pose) in poses.iter().enumerate() {
            info!("Sequence step {}/{}: {}", i + 1, poses.len(), pose.name);
            self.move_to_pose(pose)?;
            thread::sleep(self.timeouts.settle);
        }

        Ok(())
    }

    pub fn open_gripper(&mut self) -> Result<(), ArmError> {
        self.send(&[ArmCmd::OpenGripper])?;
        self.wait_for("the gripper to open", |r| *r == ArmResponse::GripperOpened)?;

        let open_deg = self.safety.params().gripper.min_deg;
        if let Some(ref mut p) = self.current_pose {
            p.gripper = open_deg;
        }

        Ok(())
    }

    pub fn close_gripper(&mut self) -> Result<(), ArmError> {
        self.send(&[ArmCmd::CloseGripper])?;
        self.wait_for("the gripper to close", |r| *r == ArmResponse::GripperClosed)?;

        let closed_deg = self.safety.params().gripper.max_deg;
        if let Some(ref mut p) = self.current_pose {
            p.gripper = closed_deg;
        }

        Ok(())
    }

    /// Home the arm using the controller's own home command.
    ///
    /// Used as the emergency stop: it bypasses the safety checks and doesn't wait for the arm to
    /// arrive, only for the controller to acknowledge.
    pub fn emergency_stop(&mut self, home: &Pose) -> Result<Vec<ArmResponse>, ArmError> {
        warn!("EMERGENCY STOP ACTIVATED");

        // Leave manual mode first in case an earlier exchange was cut short. In idle mode the
        // `x` is answered with an unknown command error, which is drained here.
        self.send(&[ArmCmd::ExitManual, ArmCmd::Home])?;
        let responses = self.collect_until_quiet()?;
        self.current_pose = Some(home.clone());

        Ok(responses)
    }

    /// Send raw text and collect every response until the controller goes quiet.
    pub fn send_raw(&mut self, text: &str) -> Result<Vec<ArmResponse>, ArmError> {
        self.write(text.as_bytes())?;

        // Anything sent in manual mode could have moved a joint
        self.current_pose = None;

        self.collect_until_quiet()
    }

    /// Collect every response until no new line has arrived for the quiet period.
    fn collect_until_quiet(&mut self) -> Result<Vec<ArmResponse>, ArmError> {
        let mut all = Vec::new();
        let mut last_rx = Instant::now();

        while last_rx.elapsed() < self.timeouts.quiet {
            let responses = self.read_responses()?;
            if !responses.is_empty() {
                last_rx = Instant::now();
                all.extend(responses);
            }
            thread::sleep(POLL_PERIOD);
        }

        Ok(all)
    }

    pub fn current_pose(&self) -> Option<&Pose> {
        self.current_pose.as_ref()
    }

    pub fn safety(&self) -> &SafetyChecker {
        &self.safety
    }

    pub fn safety_mut(&mut self) -> &mut SafetyChecker {
        &mut self.safety
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    fn send(&mut self, cmds: &[ArmCmd]) -> Result<(), ArmError> {
        // Responses left over from an earlier exchange must not be matched against this one
        for stale in self.read_responses()? {
            debug!("Discarding stale response: {}", stale);
        }

        let wire: String = cmds.iter().map(|c| c.to_wire()).collect();
        debug!("Sending {:?}", wire);

        self.write(wire.as_bytes())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ArmError> {
        self.port
            .write_all(bytes)
            .and_then(|_| self.port.flush())
            .map_err(|e: io::Error| ArmError::Link(SerialLinkError::WriteError(e)))
    }

    /// Read and parse every complete line currently available.
    fn read_responses(&mut self) -> Result<Vec<ArmResponse>, ArmError> {
        let bytes = serial::read_available(&mut self.port)?;
        let mut responses = Vec::new();

        for line in self.lines.push(&bytes) {
            match line.parse::<ArmResponse>() {
                Ok(r) => {
                    debug!("Arm: {}", r);
                    responses.push(r);
                }
                Err(e) => warn!("{}", e),
            }
        }

        Ok(responses)
    }

    /// Wait until `done` returns true for a response, failing on any error response.
    ///
    /// On failure the current pose is forgotten, as the joints the controller accepted before
    /// the error or the timeout still move.
    fn wait_for<F>(&mut self, what: &str, done: F) -> Result<(), ArmError>
    where
        F: FnMut(&ArmResponse) -> bool,
    {
        let result = self.await_response(what, done);

        if result.is_err() {
            self.current_pose = None;
        }

        result
    }

    fn await_response<F>(&mut self, what: &str, mut done: F) -> Result<(), ArmError>
    where
        F: FnMut(&ArmResponse) -> bool,
    {
        let start = Instant::now();

        while start.elapsed() < self.timeouts.response {
            for r in self.read_responses()? {
                if r.is_error() {
                    return Err(ArmError::Rejected(r));
                }
                if done(&r) {
                    return Ok(());
                }
            }
            thread::sleep(POLL_PERIOD);
        }

        Err(ArmError::Timeout(what.to_string()))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{poses::PoseLibrary, safety::SafetyParams, sim::SimArm};
    use arm_lib::arm_ctrl;
    use comms_if::serial::mock::MockPort;

    fn timeouts() -> Timeouts {
        Timeouts {
            response: Duration::from_millis(500),
            quiet: Duration::from_millis(20),
            settle: Duration::from_millis(0),
        }
    }

    fn arm() -> RobotArm<SimArm> {
        RobotArm::new(
            SimArm::new(),
            SafetyChecker::new(SafetyParams::default()),
            timeouts(),
        )
    }

    #[test]
    fn test_wait_ready() {
        let mut arm = arm();

        assert!(arm.wait_ready(Duration::from_millis(100)).unwrap());

        // Ready is only sent once
        assert!(!arm.wait_ready(Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn test_move_to_pose() {
        let lib = PoseLibrary::default();
        let mut arm = arm();

        arm.move_to_pose(lib.pose("pickup").unwrap()).unwrap();

        assert_eq!(arm.port_mut().angles(), vec![90, 45, 135, 90, 10]);
        assert_eq!(arm.current_pose().unwrap().name, "pickup");
        assert_eq!(arm.port_mut().ctrl.mode(), arm_ctrl::Mode::Idle);
    }

    #[test]
    fn test_unsafe_pose_not_sent() {
        let mut arm = arm();

        let low = Pose::new("low", [90, 10, 90, 90, 10]);
        assert!(matches!(
            arm.move_to_pose(&low),
            Err(ArmError::Unsafe(SafetyError::OutOfRange { .. }))
        ));

        let tucked = Pose::new("tucked", [90, 20, 10, 90, 10]);
        assert!(matches!(
            arm.move_to_pose(&tucked),
            Err(ArmError::Unsafe(SafetyError::Collision(_)))
        ));

        assert_eq!(arm.port_mut().angles(), vec![90, 90, 90, 90, 10]);
        assert!(arm.current_pose().is_none());
        assert_eq!(arm.safety().stats().safety_violation_count, 1);
        assert_eq!(arm.safety().stats().collision_count, 1);
    }

    #[test]
    fn test_move_joint_and_transition() {
        let lib = PoseLibrary::default();
        let home = lib.pose("home").unwrap();
        let mut arm = arm();

        arm.move_joint(JointId::Base, 0, home).unwrap();
        assert_eq!(arm.port_mut().angles(), vec![0, 90, 90, 90, 10]);

        // 180 degrees in one go is too far
        assert!(matches!(
            arm.move_joint(JointId::Base, 180, home),
            Err(ArmError::Unsafe(SafetyError::UnsafeTransition {
                change_deg: 180,
                ..
            }))
        ));
        assert_eq!(arm.port_mut().angles()[0], 0);

        arm.move_joint(JointId::Base, 90, home).unwrap();
        arm.move_joint(JointId::Base, 180, home).unwrap();
        assert_eq!(arm.port_mut().angles(), vec![180, 90, 90, 90, 10]);
    }

    #[test]
    fn test_controller_rejection() {
        // Looser limits than the controller's so the pose gets sent
        let mut params = SafetyParams::default();
        params.shoulder.min_deg = 0;

        let mut arm = RobotArm::new(SimArm::new(), SafetyChecker::new(params), timeouts());

        let err = arm
            .move_to_pose(&Pose::new("low", [90, 10, 90, 90, 10]))
            .unwrap_err();

        assert!(matches!(
            err,
            ArmError::Rejected(ArmResponse::OutOfRange {
                joint: JointId::Shoulder,
                angle_deg: 10,
                min_deg: 15,
                max_deg: 165
            })
        ));
        assert!(arm.current_pose().is_none());
    }

    #[test]
    fn test_rejection_forgets_pose() {
        let lib = PoseLibrary::default();

        let mut params = SafetyParams::default();
        params.shoulder.min_deg = 0;

        let mut arm = RobotArm::new(SimArm::new(), SafetyChecker::new(params), timeouts());

        arm.move_to_pose(lib.pose("home").unwrap()).unwrap();
        assert_eq!(arm.current_pose().unwrap().name, "home");

        // The shoulder is refused but the base still swings out
        assert!(matches!(
            arm.move_to_pose(&Pose::new("reach", [170, 10, 90, 90, 10])),
            Err(ArmError::Rejected(ArmResponse::OutOfRange { .. }))
        ));
        assert_eq!(arm.port_mut().angles(), vec![170, 90, 90, 90, 10]);
        assert!(arm.current_pose().is_none());
    }

    #[test]
    fn test_gripper() {
        let lib = PoseLibrary::default();
        let mut arm = arm();

        arm.move_to_pose(lib.pose("home").unwrap()).unwrap();

        arm.close_gripper().unwrap();
        assert_eq!(arm.port_mut().ctrl.angle_deg(JointId::Gripper), Some(90));
        assert_eq!(arm.current_pose().unwrap().gripper, 90);

        arm.open_gripper().unwrap();
        assert_eq!(arm.port_mut().ctrl.angle_deg(JointId::Gripper), Some(10));
        assert_eq!(arm.current_pose().unwrap().gripper, 10);
    }

    #[test]
    fn test_run_sequence() {
        let lib = PoseLibrary::default();
        let mut arm = arm();

        arm.run_sequence(&lib.sequence("towel_fold").unwrap())
            .unwrap();

        assert_eq!(arm.port_mut().angles(), vec![90, 90, 90, 90, 10]);
        assert_eq!(arm.current_pose().unwrap().name, "home");
    }

    #[test]
    fn test_emergency_stop() {
        let lib = PoseLibrary::default();
        let mut arm = arm();

        arm.move_to_pose(lib.pose("lift").unwrap()).unwrap();

        let responses = arm.emergency_stop(lib.pose("home").unwrap()).unwrap();

        assert_eq!(
            responses,
            vec![
                ArmResponse::UnknownCommand(b'x'),
                ArmResponse::Homing,
                ArmResponse::HomeReached
            ]
        );
        assert_eq!(arm.port_mut().angles(), vec![90, 90, 90, 90, 10]);
        assert_eq!(arm.current_pose().unwrap().name, "home");

        // The drained error doesn't break the next exchange
        arm.move_to_pose(lib.pose("pickup").unwrap()).unwrap();
    }

    #[test]
    fn test_send_raw() {
        let mut arm = arm();

        assert_eq!(
            arm.send_raw("m b45\nx").unwrap(),
            vec![
                ArmResponse::Ready,
                ArmResponse::ManualEntered,
                ArmResponse::ManualExited,
                ArmResponse::JointReached {
                    joint: JointId::Base,
                    angle_deg: 45
                }
            ]
        );
        assert!(arm.current_pose().is_none());
    }

    #[test]
    fn test_timeout() {
        let mut arm = RobotArm::new(
            MockPort::new(),
            SafetyChecker::new(SafetyParams::default()),
            Timeouts {
                response: Duration::from_millis(30),
                ..timeouts()
            },
        );

        assert!(matches!(arm.open_gripper(), Err(ArmError::Timeout(_))));
        assert_eq!(arm.port_mut().tx_string(), "o");
    }
}
