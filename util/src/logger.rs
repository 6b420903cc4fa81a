//! Logger setup shared by the arm executables
//!
//! Every executable logs to two places: the terminal, coloured, and the
//! session's log file, plain. The control loops run at up to 100 Hz and trace
//! their status every cycle, so trace records only ever go to the file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Most verbose level printed to the terminal.
pub const TERMINAL_MAX_LEVEL: LevelFilter = LevelFilter::Debug;

/// Crates whose records are capped at `INFO` whatever the chosen level.
const NOISY_CRATES: [&str; 1] = ["serialport"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log level must be at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` applies to the log file. The terminal gets the same records
/// except for those above [`TERMINAL_MAX_LEVEL`].
///
/// # Notes
///
/// - `min_level` must not be below `INFO`, warnings and errors are always
///   recorded.
/// - Must only be called once, the `log` facade accepts a single logger.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let terminal = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                coloured_level(record.level()),
                Body(record, message)
            ))
        })
        .level(min_level.min(TERMINAL_MAX_LEVEL))
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {:5}] {}",
                session::get_elapsed_seconds(),
                record.level(),
                Body(record, message)
            ))
        })
        .chain(log_file);

    let mut root = fern::Dispatch::new().level(min_level);
    for name in NOISY_CRATES.iter() {
        root = root.level_for(*name, LevelFilter::Info);
    }

    root.chain(terminal)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level name (like `"debug"`) from a parameter file.
///
/// Unrecognised names give `None`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.parse().ok()
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// Message of a record, prefixed by its target below `INFO` so debug output
/// shows which module it came from.
struct Body<'a, 'b>(&'a Record<'b>, &'a fmt::Arguments<'a>);

impl fmt::Display for Body<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.level() > Level::Info {
            write!(f, "{}: {}", self.0.target(), self.1)
        }
        else {
            write!(f, "{}", self.1)
        }
    }
}

fn coloured_level(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
