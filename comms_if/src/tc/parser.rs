//! Byte stream parser for the arm command protocol

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{
    ArmCmd, TOKEN_CLOSE_GRIPPER, TOKEN_ENTER_MANUAL, TOKEN_EXIT_MANUAL, TOKEN_HOME,
    TOKEN_OPEN_GRIPPER,
};
use crate::eqpt::JointId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Incremental parser turning received bytes into [`ArmCmd`]s.
///
/// The parser keeps state between calls to [`CmdParser::feed`] so a command may be split across
/// several reads. A joint selector's integer is only complete once a non-digit byte arrives, so
/// the owner of the parser must call [`CmdParser::flush`] if the stream goes quiet while
/// [`CmdParser::is_pending`] is true.
#[derive(Debug, Default)]
pub struct CmdParser {
    pending: Option<PendingJoint>,
}

/// A joint selector which is waiting for the rest of its integer.
#[derive(Debug, Clone, Copy)]
struct PendingJoint {
    joint: JointId,
    negative: bool,
    value: Option<i64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a slice of received bytes, returning all commands completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ArmCmd> {
        let mut cmds = Vec::new();

        for &b in bytes {
            self.push(b, &mut cmds);
        }

        cmds
    }

    /// Complete any pending joint command with whatever integer has been received so far.
    pub fn flush(&mut self) -> Option<ArmCmd> {
        self.pending.take().map(PendingJoint::finish)
    }

    /// True if a joint selector is waiting for more digits.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn push(&mut self, byte: u8, cmds: &mut Vec<ArmCmd>) {
        if let Some(p) = self.pending.as_mut() {
            let consumed = match byte {
                b'0'..=b'9' => {
                    let digit = (byte - b'0') as i64;
                    // Saturate rather than overflow, anything this large is out of range anyway
                    p.value = Some(
                        p.value
                            .unwrap_or(0)
                            .saturating_mul(10)
                            .saturating_add(digit)
                            .min(i32::MAX as i64),
                    );
                    true
                }
                b'-' if p.value.is_none() && !p.negative => {
                    p.negative = true;
                    true
                }
                b if b.is_ascii_whitespace() => p.value.is_none() && !p.negative,
                _ => false,
            };

            if consumed {
                return;
            }

            // Any other byte ends the integer and is then parsed on its own
            if let Some(cmd) = self.flush() {
                cmds.push(cmd);
            }
        }

        if byte.is_ascii_whitespace() {
            return;
        }

        if let Some(joint) = JointId::from_selector(byte) {
            self.pending = Some(PendingJoint {
                joint,
                negative: false,
                value: None,
            });
            return;
        }

        cmds.push(match byte {
            TOKEN_HOME => ArmCmd::Home,
            TOKEN_OPEN_GRIPPER => ArmCmd::OpenGripper,
            TOKEN_CLOSE_GRIPPER => ArmCmd::CloseGripper,
            TOKEN_ENTER_MANUAL => ArmCmd::EnterManual,
            TOKEN_EXIT_MANUAL => ArmCmd::ExitManual,
            b => ArmCmd::Unknown(b),
        });
    }
}

impl PendingJoint {
    fn finish(self) -> ArmCmd {
        ArmCmd::SetJoint {
            joint: self.joint,
            angle_deg: self.value.map(|v| {
                let v = v as i32;
                if self.negative {
                    -v
                } else {
                    v
                }
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
