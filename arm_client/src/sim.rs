//! Simulated arm for the client's tests.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
};

use arm_lib::arm_ctrl::{self, ArmCtrl, InputData};
use comms_if::{
    eqpt::ARM_JOINTS,
    tc::{ArmResponse, CmdParser},
};
use util::module::State;

/// A port with the arm controller on the other end.
///
/// Every write is parsed and processed straight away, running the controller until the arm
/// stops, and its responses are queued to be read back.
pub struct SimArm {
    pub ctrl: ArmCtrl,
    parser: CmdParser,
    rx: VecDeque<u8>,
}

impl SimArm {
    pub fn new() -> Self {
        let mut ctrl = ArmCtrl::default();
        ctrl.init(arm_ctrl::Params::default()).unwrap();

        let mut sim = Self {
            ctrl,
            parser: CmdParser::new(),
            rx: VecDeque::new(),
        };
        let startup = sim.ctrl.startup().unwrap();
        sim.queue(&startup.responses);

        sim
    }

    fn queue(&mut self, responses: &[ArmResponse]) {
        for r in responses {
            self.rx.extend(format!("{}\r\n", r).bytes());
        }
    }

    pub fn angles(&self) -> Vec<i32> {
        ARM_JOINTS
            .iter()
            .map(|j| self.ctrl.angle_deg(*j).unwrap())
            .collect()
    }
}

impl Read for SimArm {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }

        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }

        Ok(n)
    }
}

impl Write for SimArm {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut cmds = self.parser.feed(buf);
        cmds.extend(self.parser.flush());

        let (out, _) = self.ctrl.proc(&InputData { cmds }).unwrap();
        self.queue(&out.responses);

        while self.ctrl.is_moving() {
            let (out, _) = self.ctrl.proc(&InputData::default()).unwrap();
            self.queue(&out.responses);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
