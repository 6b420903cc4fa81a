//! # Serial Module
//!
//! This module provides the serial link abstractions used between the arm controller and its
//! operators, built on top of the `serialport` crate. The link types are generic over any
//! `Read + Write` port so they can be driven by mock ports in tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::{self, Read, Write},
    time::{Duration, Instant},
};

use log::{trace, warn};
use serde::Deserialize;

use crate::tc::{ArmCmd, ArmResponse, CmdParser};

// Export serialport
pub use serialport;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the buffer used for each read from the port.
const READ_CHUNK_SIZE: usize = 64;

/// Longest line a [`LineBuffer`] will hold. Longer lines are dropped.
pub const MAX_LINE_LEN: usize = 128;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters describing a serial port.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialParams {
    /// Path to the port, for example `/dev/ttyUSB0`
    pub port: String,

    /// Baud rate of the link
    pub baud_rate: u32,

    /// Maximum time a single read may block for.
    ///
    /// Units: milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Controller end of the command link.
///
/// Reads bytes from the port without blocking (beyond the port's read timeout), parses them into
/// [`ArmCmd`]s, and writes [`ArmResponse`]s back as CRLF terminated lines.
pub struct CmdLink<P> {
    port: P,

    parser: CmdParser,

    /// Time after the last received byte at which a pending joint integer is considered complete
    int_timeout: Duration,

    last_rx: Instant,
}

/// Splits a byte stream into lines.
///
/// Carriage returns are stripped and empty lines are dropped. A line longer than
/// [`MAX_LINE_LEN`] is dropped whole, up to and including its newline.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,

    /// Set while skipping the rest of an overlong line
    overflowed: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum SerialLinkError {
    #[error("Could not open serial port {0}: {1}")]
    OpenError(String, serialport::Error),

    #[error("Could not read from the serial port: {0}")]
    ReadError(io::Error),

    #[error("Could not write to the serial port: {0}")]
    WriteError(io::Error),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open the serial port described by the parameters.
pub fn open(params: &SerialParams) -> Result<Box<dyn serialport::SerialPort>, SerialLinkError> {
    serialport::new(&params.port, params.baud_rate)
        .timeout(Duration::from_millis(params.read_timeout_ms))
        .open()
        .map_err(|e| SerialLinkError::OpenError(params.port.clone(), e))
}

/// Read whatever bytes are currently available on the port.
///
/// A read timeout is not an error, it just means nothing was available, in which case an empty
/// vector is returned.
pub fn read_available<P: Read>(port: &mut P) -> Result<Vec<u8>, SerialLinkError> {
    let mut bytes = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match port.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                bytes.extend_from_slice(&chunk[..n]);
                // A short read means the port has been drained
                if n < READ_CHUNK_SIZE {
                    break;
                }
            }
            Err(e) if is_timeout(&e) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SerialLinkError::ReadError(e)),
        }
    }

    Ok(bytes)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P> CmdLink<P>
where
    P: Read + Write,
{
    /// Create a new link over the given port.
    ///
    /// ## Arguments
    /// - `port` - The opened port to use
    /// - `int_timeout` - How long to wait for more digits of a joint angle before treating the
    ///   angle as complete
    pub fn new(port: P, int_timeout: Duration) -> Self {
        Self {
            port,
            parser: CmdParser::new(),
            int_timeout,
            last_rx: Instant::now(),
        }
    }

    /// Poll the port for new commands.
    ///
    /// Returns an empty vector if no complete command has been received.
    pub fn poll(&mut self) -> Result<Vec<ArmCmd>, SerialLinkError> {
        let bytes = read_available(&mut self.port)?;

        if !bytes.is_empty() {
            trace!("Received {:?}", String::from_utf8_lossy(&bytes));
            self.last_rx = Instant::now();
        }

        let mut cmds = self.parser.feed(&bytes);

        if self.parser.is_pending() && self.last_rx.elapsed() >= self.int_timeout {
            if let Some(cmd) = self.parser.flush() {
                cmds.push(cmd);
            }
        }

        Ok(cmds)
    }

    /// Send a response to the operator.
    pub fn send(&mut self, response: &ArmResponse) -> Result<(), SerialLinkError> {
        write!(self.port, "{}\r\n", response)
            .and_then(|_| self.port.flush())
            .map_err(SerialLinkError::WriteError)
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes to the buffer, returning every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &b in bytes {
            if b == b'\n' {
                if !self.overflowed {
                    let line = String::from_utf8_lossy(&self.partial).trim().to_string();
                    if !line.is_empty() {
                        lines.push(line);
                    }
                }
                self.partial.clear();
                self.overflowed = false;
            } else if self.overflowed {
                continue;
            } else if self.partial.len() >= MAX_LINE_LEN {
                warn!(
                    "Dropping a line longer than {} bytes, check the baud rate",
                    MAX_LINE_LEN
                );
                self.partial.clear();
                self.overflowed = true;
            } else {
                self.partial.push(b);
            }
        }

        lines
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn default_read_timeout_ms() -> u64 {
    1
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
