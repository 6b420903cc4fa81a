//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use super::{Actuator, ArmCtrlError, Params, Ramp};
use comms_if::{
    eqpt::{JointId, ARM_JOINTS, NUM_JOINTS},
    tc::{ArmCmd, ArmResponse},
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Default)]
pub struct ArmCtrl {
    pub(crate) params: Params,

    /// Joints of the arm, ordered like `ARM_JOINTS`. Empty until initialised.
    actuators: Vec<Actuator>,

    mode: Mode,

    /// The move currently being executed.
    active: Option<ActiveMove>,

    /// Moves waiting for the active one to finish.
    queue: VecDeque<Move>,

    report: StatusReport,
}

/// Input data to Arm Control.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// Commands received since the last cycle, in the order they arrived.
    pub cmds: Vec<ArmCmd>,
}

/// Output data from Arm Control.
#[derive(Debug, Default, Clone)]
pub struct OutputData {
    /// Angles which must be written to the servos this cycle.
    pub dems: Vec<ServoDem>,

    /// Responses to send to the operator.
    pub responses: Vec<ArmResponse>,
}

/// A demand for a single servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServoDem {
    pub joint: JointId,
    pub channel: u8,
    pub angle_deg: i32,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub mode: Mode,

    /// Current angle of every joint, ordered like `ARM_JOINTS`.
    pub angles_deg: [i32; NUM_JOINTS],

    /// The joint currently being moved, if any.
    pub moving: Option<JointId>,

    /// Number of moves waiting in the queue.
    pub queued_moves: usize,

    /// Number of commands rejected this cycle.
    pub num_rejected: usize,
}

/// A single joint move waiting to be executed.
#[derive(Debug, Clone)]
struct Move {
    joint: JointId,
    target_deg: i32,

    /// Response sent once the joint reaches its target.
    on_complete: Option<ArmResponse>,
}

#[derive(Debug, Clone)]
struct ActiveMove {
    joint: JointId,
    ramp: Ramp,
    on_complete: Option<ArmResponse>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Command mode of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Accepts the top level commands.
    Idle,

    /// Accepts joint commands until exited.
    Manual,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Mode {
    fn default() -> Self {
        Mode::Idle
    }
}

impl State for ArmCtrl {
    type InitData = Params;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// All actuators are placed at their home angles. Call [`ArmCtrl::startup`] to get the
    /// demands which move the servos there.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.validate()?;

        self.actuators = ARM_JOINTS
            .iter()
            .map(|id| Actuator::new(*id, init_data.joints.get(*id)))
            .collect();

        self.params = init_data;
        self.mode = Mode::Idle;
        self.active = None;
        self.queue.clear();

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    ///
    /// Handles all new commands then advances the active move by one step.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if self.actuators.is_empty() {
            return Err(ArmCtrlError::NotInitialised);
        }

        // Clear the status report
        self.report = StatusReport::default();

        let mut output = OutputData::default();

        for cmd in input_data.cmds.iter() {
            debug!("New ArmCtrl ArmCmd::{:?}", cmd);

            if let Err(e) = self.handle_cmd(cmd, &mut output.responses) {
                warn!("{}", e);
                self.report.num_rejected += 1;

                if let Some(r) = e.response() {
                    output.responses.push(r);
                }
            }
        }

        self.step(&mut output);

        self.report.mode = self.mode;
        self.report.moving = self.active.as_ref().map(|a| a.joint);
        self.report.queued_moves = self.queue.len();
        for act in self.actuators.iter() {
            self.report.angles_deg[act.id().index()] = act.angle_deg();
        }

        Ok((output, self.report))
    }
}

impl ArmCtrl {
    /// Demands placing every servo at its home angle, followed by the ready response.
    pub fn startup(&self) -> Result<OutputData, ArmCtrlError> {
        if self.actuators.is_empty() {
            return Err(ArmCtrlError::NotInitialised);
        }

        info!("ArmCtrl starting up, all joints to home");

        Ok(OutputData {
            dems: self.actuators.iter().map(Self::dem).collect(),
            responses: vec![ArmResponse::Ready],
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current angle of a joint, or `None` before initialisation.
    pub fn angle_deg(&self, joint: JointId) -> Option<i32> {
        self.actuators.get(joint.index()).map(|a| a.angle_deg())
    }

    /// True while a move is executing or waiting.
    pub fn is_moving(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    /// Dispatch a single command according to the current mode.
    fn handle_cmd(
        &mut self,
        cmd: &ArmCmd,
        responses: &mut Vec<ArmResponse>,
    ) -> Result<(), ArmCtrlError> {
        match self.mode {
            Mode::Idle => match *cmd {
                ArmCmd::Home => {
                    let gripper_open = self.params.joints.gripper.home_deg;
                    let mut moves: Vec<Move> = ARM_JOINTS
                        .iter()
                        .filter(|id| **id != JointId::Gripper)
                        .map(|id| Move {
                            joint: *id,
                            target_deg: self.params.joints.get(*id).home_deg,
                            on_complete: None,
                        })
                        .collect();
                    moves.push(Move {
                        joint: JointId::Gripper,
                        target_deg: gripper_open,
                        on_complete: Some(ArmResponse::HomeReached),
                    });

                    self.enqueue(moves)?;
                    responses.push(ArmResponse::Homing);
                }
                ArmCmd::OpenGripper => {
                    let target_deg = self.params.joints.gripper.home_deg;
                    self.enqueue_checked(
                        JointId::Gripper,
                        target_deg,
                        ArmResponse::GripperOpened,
                    )?;
                }
                ArmCmd::CloseGripper => {
                    let target_deg = self.params.gripper_closed_deg;
                    self.enqueue_checked(
                        JointId::Gripper,
                        target_deg,
                        ArmResponse::GripperClosed,
                    )?;
                }
                ArmCmd::EnterManual => {
                    info!("Entering manual mode");
                    self.mode = Mode::Manual;
                    responses.push(ArmResponse::ManualEntered);
                }
                ArmCmd::SetJoint { .. } | ArmCmd::ExitManual | ArmCmd::Unknown(_) => {
                    return Err(ArmCtrlError::UnknownCommand(cmd.token()))
                }
            },
            Mode::Manual => match *cmd {
                ArmCmd::SetJoint {
                    joint,
                    angle_deg: Some(angle_deg),
                } => {
                    self.enqueue_checked(
                        joint,
                        angle_deg,
                        ArmResponse::JointReached { joint, angle_deg },
                    )?;
                }
                ArmCmd::SetJoint {
                    joint,
                    angle_deg: None,
                } => return Err(ArmCtrlError::MissingAngle(joint)),
                ArmCmd::ExitManual => {
                    info!("Exiting manual mode");
                    self.mode = Mode::Idle;
                    responses.push(ArmResponse::ManualExited);
                }
                _ => debug!("Ignoring {:?} in manual mode", cmd),
            },
        }

        Ok(())
    }

    /// Check a target against the joint's bounds and queue the move to it.
    fn enqueue_checked(
        &mut self,
        joint: JointId,
        target_deg: i32,
        on_complete: ArmResponse,
    ) -> Result<(), ArmCtrlError> {
        self.actuators[joint.index()].check_target(target_deg)?;

        self.enqueue(vec![Move {
            joint,
            target_deg,
            on_complete: Some(on_complete),
        }])
    }

    /// Queue a group of moves. Either all of them are queued or none are.
    fn enqueue(&mut self, moves: Vec<Move>) -> Result<(), ArmCtrlError> {
        if self.queue.len() + moves.len() > self.params.max_queued_moves {
            return Err(ArmCtrlError::QueueFull);
        }

        self.queue.extend(moves);
        Ok(())
    }

    /// Advance the active move by one degree, starting the next queued move if none is active.
    ///
    /// Moves which are already at their target complete without taking a step.
    fn step(&mut self, output: &mut OutputData) {
        loop {
            let mut active = match self.active.take() {
                Some(a) => a,
                None => match self.start_next() {
                    Some(a) => a,
                    None => return,
                },
            };

            let act = &mut self.actuators[active.joint.index()];

            if let Some(angle_deg) = act.step(&mut active.ramp) {
                output.dems.push(Self::dem(act));
                debug!("{} -> {} deg", active.joint, angle_deg);
            }

            if active.ramp.is_done() {
                if let Some(r) = active.on_complete.take() {
                    output.responses.push(r);
                }

                // A move which didn't write anything doesn't use up the cycle
                if output.dems.is_empty() {
                    continue;
                }
            } else {
                self.active = Some(active);
            }

            return;
        }
    }

    /// Pop moves off the queue until one can be started.
    fn start_next(&mut self) -> Option<ActiveMove> {
        while let Some(m) = self.queue.pop_front() {
            match self.actuators[m.joint.index()].ramp_to(m.target_deg) {
                Ok(ramp) => {
                    return Some(ActiveMove {
                        joint: m.joint,
                        ramp,
                        on_complete: m.on_complete,
                    })
                }
                Err(e) => warn!("Dropping queued move: {}", e),
            }
        }

        None
    }

    fn dem(act: &Actuator) -> ServoDem {
        ServoDem {
            joint: act.id(),
            channel: act.channel(),
            angle_deg: act.angle_deg(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::CmdParser;

    fn init_ctrl() -> ArmCtrl {
        let mut ctrl = ArmCtrl::default();
        ctrl.init(Params::default()).unwrap();
        ctrl
    }

    /// Feed the wire text to the controller in a single cycle.
    fn send(ctrl: &mut ArmCtrl, wire: &str) -> OutputData {
        let mut parser = CmdParser::new();
        let mut cmds = parser.feed(wire.as_bytes());
        cmds.extend(parser.flush());

        ctrl.proc(&InputData { cmds }).unwrap().0
    }

    /// Run cycles with no commands until the arm stops, collecting all outputs.
    fn run_until_stopped(ctrl: &mut ArmCtrl) -> OutputData {
        let mut all = OutputData::default();

        for _ in 0..10_000 {
            if !ctrl.is_moving() {
                return all;
            }

            let (out, _) = ctrl.proc(&InputData::default()).unwrap();
            all.dems.extend(out.dems);
            all.responses.extend(out.responses);
        }

        panic!("Arm never stopped moving");
    }

    /// Send the wire text then run until the arm stops.
    fn send_and_run(ctrl: &mut ArmCtrl, wire: &str) -> OutputData {
        let mut all = send(ctrl, wire);
        let rest = run_until_stopped(ctrl);
        all.dems.extend(rest.dems);
        all.responses.extend(rest.responses);
        all
    }

    fn angles(ctrl: &ArmCtrl) -> Vec<i32> {
        ARM_JOINTS
            .iter()
            .map(|j| ctrl.angle_deg(*j).unwrap())
            .collect()
    }

    #[test]
    fn test_not_initialised() {
        let mut ctrl = ArmCtrl::default();

        assert_eq!(
            ctrl.proc(&InputData::default()).unwrap_err(),
            ArmCtrlError::NotInitialised
        );
        assert!(ctrl.startup().is_err());
    }

    #[test]
    fn test_startup() {
        let ctrl = init_ctrl();
        let out = ctrl.startup().unwrap();

        assert_eq!(out.dems.len(), NUM_JOINTS);
        assert_eq!(out.responses, vec![ArmResponse::Ready]);
        assert_eq!(angles(&ctrl), vec![90, 90, 90, 90, 10]);
        assert_eq!(ctrl.mode(), Mode::Idle);
    }

    #[test]
    fn test_manual_then_home() {
        let mut ctrl = init_ctrl();

        let out = send_and_run(&mut ctrl, "mb45s100x");
        assert_eq!(ctrl.mode(), Mode::Idle);
        assert_eq!(ctrl.angle_deg(JointId::Base), Some(45));
        assert_eq!(ctrl.angle_deg(JointId::Shoulder), Some(100));
        assert_eq!(
            out.responses,
            vec![
                ArmResponse::ManualEntered,
                ArmResponse::ManualExited,
                ArmResponse::JointReached {
                    joint: JointId::Base,
                    angle_deg: 45
                },
                ArmResponse::JointReached {
                    joint: JointId::Shoulder,
                    angle_deg: 100
                },
            ]
        );

        // Base moves 45 steps, shoulder 10, each one degree per cycle
        assert_eq!(out.dems.len(), 55);

        let out = send_and_run(&mut ctrl, "h");
        assert_eq!(
            out.responses,
            vec![ArmResponse::Homing, ArmResponse::HomeReached]
        );
        assert_eq!(angles(&ctrl), vec![90, 90, 90, 90, 10]);
    }

    #[test]
    fn test_home_twice() {
        let mut ctrl = init_ctrl();

        send_and_run(&mut ctrl, "h");
        let first = angles(&ctrl);

        let out = send_and_run(&mut ctrl, "h");

        assert_eq!(angles(&ctrl), first);
        assert!(out.dems.is_empty());
        assert_eq!(
            out.responses,
            vec![ArmResponse::Homing, ArmResponse::HomeReached]
        );
        assert_eq!(angles(&ctrl), vec![90, 90, 90, 90, 10]);
    }

    #[test]
    fn test_home_order() {
        let mut ctrl = init_ctrl();

        send_and_run(&mut ctrl, "mb92s88e91w89g12x");
        assert_eq!(angles(&ctrl), vec![92, 88, 91, 89, 12]);

        let out = send_and_run(&mut ctrl, "h");

        let joints: Vec<JointId> = out.dems.iter().map(|d| d.joint).collect();
        assert_eq!(
            joints,
            vec![
                JointId::Base,
                JointId::Base,
                JointId::Shoulder,
                JointId::Shoulder,
                JointId::Elbow,
                JointId::Wrist,
                JointId::Gripper,
                JointId::Gripper,
            ]
        );
    }

    #[test]
    fn test_ramp_steps() {
        let mut ctrl = init_ctrl();

        let out = send_and_run(&mut ctrl, "me80\n");

        let steps: Vec<i32> = out.dems.iter().map(|d| d.angle_deg).collect();
        assert_eq!(steps, (80..90).rev().collect::<Vec<i32>>());
        assert!(out.dems.iter().all(|d| d.channel == 2));
        assert_eq!(ctrl.angle_deg(JointId::Elbow), Some(80));
    }

    #[test]
    fn test_one_step_per_cycle() {
        let mut ctrl = init_ctrl();

        let out = send(&mut ctrl, "mw93\n");
        assert_eq!(out.dems.len(), 1);

        let (out, report) = ctrl.proc(&InputData::default()).unwrap();
        assert_eq!(out.dems.len(), 1);
        assert_eq!(report.moving, Some(JointId::Wrist));
        assert_eq!(report.angles_deg[JointId::Wrist.index()], 92);

        let (out, report) = ctrl.proc(&InputData::default()).unwrap();
        assert_eq!(
            out.responses,
            vec![ArmResponse::JointReached {
                joint: JointId::Wrist,
                angle_deg: 93
            }]
        );
        assert_eq!(report.moving, None);
    }

    #[test]
    fn test_out_of_range() {
        let mut ctrl = init_ctrl();

        let (out, report) = {
            let mut parser = CmdParser::new();
            let mut cmds = parser.feed(b"ms10\n");
            cmds.extend(parser.flush());
            ctrl.proc(&InputData { cmds }).unwrap()
        };

        assert_eq!(
            out.responses,
            vec![
                ArmResponse::ManualEntered,
                ArmResponse::OutOfRange {
                    joint: JointId::Shoulder,
                    angle_deg: 10,
                    min_deg: 15,
                    max_deg: 165
                }
            ]
        );
        assert!(out.dems.is_empty());
        assert_eq!(report.num_rejected, 1);
        assert!(!ctrl.is_moving());
        assert_eq!(ctrl.angle_deg(JointId::Shoulder), Some(90));

        let out = send(&mut ctrl, "g200\n");
        assert!(out.responses[0].is_error());
        assert_eq!(ctrl.angle_deg(JointId::Gripper), Some(10));
    }

    #[test]
    fn test_missing_angle() {
        let mut ctrl = init_ctrl();

        let out = send(&mut ctrl, "mb\n");
        assert_eq!(
            out.responses,
            vec![
                ArmResponse::ManualEntered,
                ArmResponse::MissingAngle {
                    joint: JointId::Base
                }
            ]
        );
    }

    #[test]
    fn test_unknown_in_idle() {
        let mut ctrl = init_ctrl();

        let out = send(&mut ctrl, "z");
        assert_eq!(out.responses, vec![ArmResponse::UnknownCommand(b'z')]);

        // Joint commands are only valid in manual mode
        let out = send(&mut ctrl, "b45\n");
        assert_eq!(out.responses, vec![ArmResponse::UnknownCommand(b'b')]);

        let out = send(&mut ctrl, "x");
        assert_eq!(out.responses, vec![ArmResponse::UnknownCommand(b'x')]);

        assert!(!ctrl.is_moving());
        assert_eq!(ctrl.mode(), Mode::Idle);
    }

    #[test]
    fn test_manual_ignores_top_level() {
        let mut ctrl = init_ctrl();

        let out = send(&mut ctrl, "mhocz");
        assert_eq!(out.responses, vec![ArmResponse::ManualEntered]);
        assert!(!ctrl.is_moving());
        assert_eq!(ctrl.mode(), Mode::Manual);
    }

    #[test]
    fn test_gripper() {
        let mut ctrl = init_ctrl();

        let out = send_and_run(&mut ctrl, "c");
        assert_eq!(out.responses, vec![ArmResponse::GripperClosed]);
        assert_eq!(out.dems.len(), 80);
        assert_eq!(ctrl.angle_deg(JointId::Gripper), Some(90));

        let out = send_and_run(&mut ctrl, "o");
        assert_eq!(out.responses, vec![ArmResponse::GripperOpened]);
        assert_eq!(ctrl.angle_deg(JointId::Gripper), Some(10));
    }

    #[test]
    fn test_already_open_gripper_responds_immediately() {
        let mut ctrl = init_ctrl();

        let out = send(&mut ctrl, "o");
        assert_eq!(out.responses, vec![ArmResponse::GripperOpened]);
        assert!(out.dems.is_empty());
        assert!(!ctrl.is_moving());
    }

    #[test]
    fn test_queue_full() {
        let mut ctrl = ArmCtrl::default();
        ctrl.init(Params {
            max_queued_moves: 5,
            ..Params::default()
        })
        .unwrap();

        // All commands of a cycle are queued before the first move starts
        let out = send(&mut ctrl, "mb80\nb70\nb60\nb50\nb40\nb30\nb20\n");

        let busy = out
            .responses
            .iter()
            .filter(|r| **r == ArmResponse::Busy)
            .count();
        assert_eq!(busy, 2);

        run_until_stopped(&mut ctrl);
        assert_eq!(ctrl.angle_deg(JointId::Base), Some(40));

        // Homing needs five slots, with one taken it is rejected as a unit
        send(&mut ctrl, "x");
        send(&mut ctrl, "c");
        send(&mut ctrl, "o");
        let (out, report) = {
            let cmds = vec![ArmCmd::Home];
            ctrl.proc(&InputData { cmds }).unwrap()
        };
        assert_eq!(out.responses, vec![ArmResponse::Busy]);
        assert_eq!(report.queued_moves, 1);
        assert_eq!(report.moving, Some(JointId::Gripper));
    }
}
