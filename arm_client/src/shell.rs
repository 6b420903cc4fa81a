//! # Interactive shell
//!
//! Parses the lines typed at the client's prompt and executes them against the arm.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io::{Read, Write};

use comms_if::eqpt::JointId;
use structopt::{clap::AppSettings, StructOpt};

use crate::{
    arm::{ArmError, RobotArm},
    poses::{PoseError, PoseLibrary},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Shell<P> {
    arm: RobotArm<P>,

    lib: PoseLibrary,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands accepted at the prompt.
#[derive(Debug, PartialEq, StructOpt)]
#[structopt(
    name = "arm",
    setting = AppSettings::NoBinaryName,
    setting = AppSettings::DisableVersion
)]
pub enum ClientCmd {
    /// Move to the home pose
    Home,

    /// Open the gripper
    Open,

    /// Close the gripper
    Close,

    /// Move to a named pose
    Pose { name: String },

    /// Run a named sequence of poses
    Seq { name: String },

    /// Move a single joint (base, shoulder, elbow, wrist or gripper), in degrees
    Joint {
        joint: JointId,

        #[structopt(allow_hyphen_values = true)]
        angle: i32,
    },

    /// List the available poses and sequences
    Poses,

    /// Show the safety statistics
    Stats,

    /// Send text to the controller as is and show its responses
    Raw { text: Vec<String> },

    /// Emergency stop, home the arm immediately
    Stop,

    /// Leave the client
    Quit,
}

/// What the prompt should do after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Arm(#[from] ArmError),

    #[error(transparent)]
    Pose(#[from] PoseError),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a line typed at the prompt.
///
/// Returns `Ok(None)` for a blank line. Parse errors, and the help output, are returned as the
/// clap error for the caller to print.
pub fn parse_line(line: &str) -> Result<Option<ClientCmd>, structopt::clap::Error> {
    let mut words = line.split_whitespace().peekable();

    if words.peek().is_none() {
        return Ok(None);
    }

    ClientCmd::from_iter_safe(words).map(Some)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P> Shell<P>
where
    P: Read + Write,
{
    pub fn new(arm: RobotArm<P>, lib: PoseLibrary) -> Self {
        Self { arm, lib }
    }

    /// Execute a command, returning the text to show the operator.
    pub fn exec(&mut self, cmd: ClientCmd) -> Result<(Flow, String), ShellError> {
        let text = match cmd {
            ClientCmd::Home => {
                let home = self.lib.pose("home")?;
                self.arm.move_to_pose(home)?;
                String::from("Arm homed")
            }
            ClientCmd::Open => {
                self.arm.open_gripper()?;
                String::from("Gripper opened")
            }
            ClientCmd::Close => {
                self.arm.close_gripper()?;
                String::from("Gripper closed")
            }
            ClientCmd::Pose { name } => {
                let pose = self.lib.pose(&name)?;
                self.arm.move_to_pose(pose)?;
                pose.to_string()
            }
            ClientCmd::Seq { name } => {
                let poses = self.lib.sequence(&name)?;
                self.arm.run_sequence(&poses)?;
                format!("Sequence {} complete ({} poses)", name, poses.len())
            }
            ClientCmd::Joint { joint, angle } => {
                let home = self.lib.pose("home")?;
                self.arm.move_joint(joint, angle, home)?;
                format!("{} at {}", joint, angle)
            }
            ClientCmd::Poses => format!(
                "Poses: {}\nSequences: {}",
                self.lib.list_poses().join(", "),
                self.lib.list_sequences().join(", ")
            ),
            ClientCmd::Stats => {
                let stats = self.arm.safety().stats();
                let current = match self.arm.current_pose() {
                    Some(p) => format!("{}\nReach: {:.1}", p, self.arm.safety().reach(p)),
                    None => String::from("unknown"),
                };
                format!(
                    "Current pose: {}\nCollisions prevented: {}\nSafety violations: {}",
                    current, stats.collision_count, stats.safety_violation_count
                )
            }
            ClientCmd::Raw { text } => {
                let responses = self.arm.send_raw(&text.join(" "))?;
                responses
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            ClientCmd::Stop => {
                let home = self.lib.pose("home")?;
                self.arm.emergency_stop(home)?;
                String::from("Emergency stop, arm homing")
            }
            ClientCmd::Quit => return Ok((Flow::Quit, String::from("Exiting..."))),
        };

        Ok((Flow::Continue, text))
    }

    pub fn arm_mut(&mut self) -> &mut RobotArm<P> {
        &mut self.arm
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        arm::Timeouts,
        safety::{SafetyChecker, SafetyParams},
        sim::SimArm,
    };
    use std::time::Duration;

    fn shell() -> Shell<SimArm> {
        let arm = RobotArm::new(
            SimArm::new(),
            SafetyChecker::new(SafetyParams::default()),
            Timeouts {
                response: Duration::from_millis(500),
                quiet: Duration::from_millis(20),
                settle: Duration::from_millis(0),
            },
        );

        Shell::new(arm, PoseLibrary::default())
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("home").unwrap(), Some(ClientCmd::Home));
        assert_eq!(
            parse_line("pose  pickup").unwrap(),
            Some(ClientCmd::Pose {
                name: "pickup".into()
            })
        );
        assert_eq!(
            parse_line("joint elbow 45").unwrap(),
            Some(ClientCmd::Joint {
                joint: JointId::Elbow,
                angle: 45
            })
        );
        assert_eq!(
            parse_line("joint base -5").unwrap(),
            Some(ClientCmd::Joint {
                joint: JointId::Base,
                angle: -5
            })
        );
        assert_eq!(
            parse_line("raw m b45 x").unwrap(),
            Some(ClientCmd::Raw {
                text: vec!["m".into(), "b45".into(), "x".into()]
            })
        );

        assert!(parse_line("dance").is_err());
        assert!(parse_line("joint knee 45").is_err());
        assert!(parse_line("joint base").is_err());
    }

    #[test]
    fn test_exec() {
        let mut shell = shell();

        let (flow, text) = shell.exec(ClientCmd::Pose { name: "lift".into() }).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            text,
            "Pose(lift): base=90, shoulder=75, elbow=90, wrist=90, gripper=90"
        );

        let (_, text) = shell
            .exec(ClientCmd::Joint {
                joint: JointId::Wrist,
                angle: 120,
            })
            .unwrap();
        assert_eq!(text, "wrist at 120");
        assert_eq!(shell.arm_mut().port_mut().angles(), vec![90, 75, 90, 120, 90]);

        shell.exec(ClientCmd::Home).unwrap();
        assert_eq!(shell.arm_mut().port_mut().angles(), vec![90, 90, 90, 90, 10]);

        assert!(matches!(
            shell.exec(ClientCmd::Seq { name: "sock_fold".into() }),
            Err(ShellError::Pose(PoseError::UnknownSequence(..)))
        ));

        assert!(matches!(
            shell.exec(ClientCmd::Joint {
                joint: JointId::Shoulder,
                angle: 5
            }),
            Err(ShellError::Arm(ArmError::Unsafe(_)))
        ));

        let (_, text) = shell.exec(ClientCmd::Stats).unwrap();
        assert!(text.starts_with("Current pose: Pose(home)"));
        assert!(text.contains("\nReach: 10.4\n"));
        assert!(text.ends_with("Collisions prevented: 0\nSafety violations: 1"));

        assert_eq!(shell.exec(ClientCmd::Quit).unwrap().0, Flow::Quit);
    }
}
