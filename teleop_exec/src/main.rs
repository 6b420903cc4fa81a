//! # Teleoperation Executable
//!
//! This executable drives a single servo from an analog input in real time, smoothing the input
//! and ignoring changes smaller than the deadband so the servo doesn't buzz.

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
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use comms_if::serial;
use servo_ctrl::{DriverKind, ServoCtrl, ServoDriver};
use teleop_lib::{
    analog::{AnalogSource, SerialAnalogSource, SimAnalogSource, SourceKind},
    params::TeleopExecParams,
    teleop_ctrl::{InputData, TeleopCtrl},
};
use util::{
    logger::{logger_init, parse_level},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "teleop_exec", about = "Analog input to servo teleoperation loop")]
struct Opts {
    /// Parameter file to use instead of `$ARM_SW_ROOT/params/teleop_exec.toml`
    #[structopt(short, long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Use the simulated servo driver and analog source whatever the parameters say
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

    let session =
        Session::new("teleop_exec", "sessions").wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let mut params: TeleopExecParams = match opts.params {
        Some(ref p) => util::params::load_path(p),
        None => util::params::load("teleop_exec.toml"),
    }
    .wrap_err("Could not load teleop_exec params")?;

    if opts.sim {
        params.driver = DriverKind::Sim;
        params.source = SourceKind::Sim;
    }

    let log_level = parse_level(&params.log_level)
        .ok_or_else(|| eyre!("Unknown log level \"{}\"", params.log_level))?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Teleoperation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE SERVO ----

    let driver = servo_ctrl::open_driver(params.driver, &params.servo)
        .wrap_err("Failed to open the servo driver")?;
    let mut servos = ServoCtrl::new(driver, params.servo)
        .wrap_err("Failed to initialise the servo controller")?;
    info!("{:?} servo driver initialised", params.driver);

    // ---- INITIALISE TELEOP CONTROL ----

    let mut teleop_ctrl = TeleopCtrl::default();
    teleop_ctrl
        .init(params.teleop_ctrl.clone())
        .wrap_err("Failed to initialise TeleopCtrl")?;
    info!("TeleopCtrl init complete");

    // ---- INITIALISE SOURCE ----

    let mut source: Box<dyn AnalogSource> = match params.source {
        SourceKind::Serial => {
            let port = serial::open(&params.serial).wrap_err("Failed to open the analog port")?;
            info!("Reading analog input from {}", params.serial.port);
            Box::new(SerialAnalogSource::new(port))
        }
        SourceKind::Sim => {
            info!("Using the simulated analog input");
            Box::new(SimAnalogSource::new(params.sim_step))
        }
    };

    info!("Initialisation complete, entering main loop\n");

    run(
        &mut teleop_ctrl,
        &mut servos,
        source.as_mut(),
        params.channel,
        Duration::from_millis(params.tick_period_ms),
    )
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn run<D>(
    teleop_ctrl: &mut TeleopCtrl,
    servos: &mut ServoCtrl<D>,
    source: &mut dyn AnalogSource,
    channel: u8,
    tick_period: Duration,
) -> Result<()>
where
    D: ServoDriver,
{
    let mut waiting_logged = false;

    loop {
        let cycle_start_instant = Instant::now();

        // ---- SAMPLE ----

        let raw = match source.sample() {
            Ok(r) => r,
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        // ---- TELEOP CONTROL PROCESSING ----

        match raw {
            Some(raw) => {
                let (output, report) = teleop_ctrl
                    .proc(&InputData { raw })
                    .wrap_err("Error during TeleopCtrl processing")?;

                if let Some(angle_deg) = output {
                    if let Err(e) = servos.set_angle(channel, angle_deg) {
                        warn!("Could not move the servo to {} deg: {}", angle_deg, e);
                    }
                }

                if log::log_enabled!(log::Level::Trace) {
                    match serde_json::to_string(&report) {
                        Ok(s) => trace!("TeleopCtrl status: {}", s),
                        Err(e) => debug!("Could not serialise the TeleopCtrl status: {}", e),
                    }
                }
            }
            None if !waiting_logged => {
                info!("Waiting for the first analog reading");
                waiting_logged = true;
            }
            None => (),
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match tick_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - tick_period.as_secs_f64()
            ),
        }
    }
}
