//! # Arm client library
//!
//! Operator side of the arm, shared by the client executable and its tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Serial client of the arm controller
pub mod arm;

/// Parameters for the client executable
pub mod params;

/// Named poses and sequences
pub mod poses;

/// Pose and transition safety checks
pub mod safety;

/// Commands typed at the prompt
pub mod shell;

#[cfg(test)]
mod sim;
