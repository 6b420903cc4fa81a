//! # Arm Control Executable
//!
//! This executable receives single character commands over a serial port and moves the five
//! joints of the arm (base, shoulder, elbow, wrist and gripper) to the commanded angles, one
//! degree per step, never leaving each joint's configured bounds.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, trace, warn};
use std::{
    io::{Read, Write},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::{ArmCtrl, OutputData},
    params::ArmExecParams,
};
use comms_if::serial::{self, CmdLink};
use servo_ctrl::{DriverKind, ServoCtrl, ServoDriver};
use util::{
    logger::{logger_init, parse_level},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Serial commanded servo arm controller")]
struct Opts {
    /// Parameter file to use instead of `$ARM_SW_ROOT/params/arm_exec.toml`
    #[structopt(short, long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Use the simulated servo driver whatever the parameters say
    #[structopt(long)]
    sim: bool,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let mut params: ArmExecParams = match opts.params {
        Some(ref p) => util::params::load_path(p),
        None => util::params::load("arm_exec.toml"),
    }
    .wrap_err("Could not load arm_exec params")?;

    if opts.sim {
        params.driver = DriverKind::Sim;
    }

    // Initialise logger
    let log_level = parse_level(&params.log_level)
        .ok_or_else(|| eyre!("Unknown log level \"{}\"", params.log_level))?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    info!("Parameters loaded");

    info!("Initialising...");

    // ---- INITIALISE SERVOS ----

    let driver = servo_ctrl::open_driver(params.driver, &params.servo)
        .wrap_err("Failed to open the servo driver")?;
    let mut servos = ServoCtrl::new(driver, params.servo)
        .wrap_err("Failed to initialise the servo controller")?;
    info!("{:?} servo driver initialised", params.driver);

    // ---- INITIALISE ARM CONTROL ----

    let mut arm_ctrl = ArmCtrl::default();
    arm_ctrl
        .init(params.arm_ctrl.clone())
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    // ---- INITIALISE SERIAL LINK ----

    let port = serial::open(&params.serial).wrap_err("Failed to open the command port")?;
    let mut link = CmdLink::new(port, Duration::from_millis(params.int_timeout_ms));
    info!(
        "Listening for commands on {} at {} baud",
        params.serial.port, params.serial.baud_rate
    );

    // Move every joint to its home angle before accepting commands
    let startup = arm_ctrl.startup()?;
    actuate(&mut servos, &mut link, &startup);

    info!("Initialisation complete, entering main loop\n");

    run(
        &mut arm_ctrl,
        &mut servos,
        &mut link,
        Duration::from_millis(params.arm_ctrl.step_period_ms),
    )
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Main control loop. Each cycle handles the received commands and moves at most one joint by one
/// degree, then sleeps for the rest of the cycle period.
fn run<D, P>(
    arm_ctrl: &mut ArmCtrl,
    servos: &mut ServoCtrl<D>,
    link: &mut CmdLink<P>,
    cycle_period: Duration,
) -> Result<()>
where
    D: ServoDriver,
    P: Read + Write,
{
    let mut num_cycles: u64 = 0;

    loop {
        let cycle_start_instant = Instant::now();

        // ---- COMMANDS ----

        let cmds = match link.poll() {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not poll the command port: {}", e);
                Vec::new()
            }
        };

        // ---- ARM CONTROL PROCESSING ----

        let (output, report) = arm_ctrl
            .proc(&arm_lib::arm_ctrl::InputData { cmds })
            .wrap_err("Error during ArmCtrl processing")?;

        actuate(servos, link, &output);

        if log::log_enabled!(log::Level::Trace) {
            match serde_json::to_string(&report) {
                Ok(s) => trace!("ArmCtrl status: {}", s),
                Err(e) => debug!("Could not serialise the ArmCtrl status: {}", e),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle {} overran by {:.06} s",
                num_cycles,
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        num_cycles += 1;
    }
}

/// Write the demands to the servos and send the responses to the operator.
///
/// Failures are logged, the loop keeps running.
fn actuate<D, P>(servos: &mut ServoCtrl<D>, link: &mut CmdLink<P>, output: &OutputData)
where
    D: ServoDriver,
    P: Read + Write,
{
    for dem in output.dems.iter() {
        if let Err(e) = servos.set_angle(dem.channel, dem.angle_deg) {
            warn!("Could not move the {} to {} deg: {}", dem.joint, dem.angle_deg, e);
        }
    }

    for response in output.responses.iter() {
        info!("{}", response);

        if let Err(e) = link.send(response) {
            warn!("Could not send \"{}\" to the operator: {}", response, e);
        }
    }
}
