//! # Arm Client Executable
//!
//! Interactive prompt for the operator. Poses, sequences and single joint moves are safety
//! checked and sent to the arm controller over the serial link.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{path::PathBuf, time::Duration};
use structopt::StructOpt;

// Internal
use client_lib::{
    arm::RobotArm,
    params::ArmClientParams,
    poses::PoseLibrary,
    safety::SafetyChecker,
    shell::{self, Flow, Shell},
};
use comms_if::serial;
use util::{
    host,
    logger::{logger_init, parse_level},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "arm $ ";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_client", about = "Interactive client for the arm controller")]
struct Opts {
    /// Parameter file to use instead of `$ARM_SW_ROOT/params/arm_client.toml`
    #[structopt(short, long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Serial port to use instead of the one in the parameters
    #[structopt(long)]
    port: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("arm_client", "sessions").wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let mut params: ArmClientParams = match opts.params {
        Some(ref p) => util::params::load_path(p),
        None => util::params::load("arm_client.toml"),
    }
    .wrap_err("Could not load arm_client params")?;

    if let Some(port) = opts.port {
        params.serial.port = port;
    }

    let log_level = parse_level(&params.log_level)
        .ok_or_else(|| eyre!("Unknown log level \"{}\"", params.log_level))?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Arm Client\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- POSES ----

    let lib = PoseLibrary::new(params.poses.clone(), params.sequences.clone())
        .wrap_err("Invalid pose library")?;
    info!(
        "{} poses and {} sequences available",
        lib.list_poses().len(),
        lib.list_sequences().len()
    );

    // ---- CONNECT ----

    let port = serial::open(&params.serial).wrap_err("Failed to open the arm's serial port")?;
    info!("Connected to {} at {} baud", params.serial.port, params.serial.baud_rate);

    let mut arm = RobotArm::new(
        port,
        SafetyChecker::new(params.safety.clone()),
        params.timeouts(),
    );

    if !arm
        .wait_ready(Duration::from_millis(params.ready_timeout_ms))
        .wrap_err("Failed waiting for the controller")?
    {
        warn!("The controller didn't report ready, it may already have been running");
    }

    // ---- PROMPT ----

    let mut shell = Shell::new(arm, lib);

    let history_path = host::get_sw_root()
        .map(|r| r.join(&params.history_file))
        .unwrap_or_else(|_| PathBuf::from(&params.history_file));

    let mut rl = DefaultEditor::new().wrap_err("Failed to create the line editor")?;
    if rl.load_history(&history_path).is_err() {
        info!("No history found at {:?}", history_path);
    }

    println!("Type `help` for the list of commands");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                let cmd = match shell::parse_line(&line) {
                    Ok(Some(c)) => c,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e.message);
                        continue;
                    }
                };

                match shell.exec(cmd) {
                    Ok((flow, text)) => {
                        println!("{}", text);
                        if flow == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted, sending emergency stop");
                if let Err(e) = shell.exec(shell::ClientCmd::Stop) {
                    warn!("Emergency stop failed: {}", e);
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                warn!("Prompt error: {}", e);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        warn!("Could not save the history: {}", e);
    }

    match serde_json::to_string(&shell.arm_mut().safety().stats()) {
        Ok(s) => info!("Safety stats: {}", s),
        Err(e) => warn!("Could not serialise the safety stats: {}", e),
    }

    Ok(())
}
