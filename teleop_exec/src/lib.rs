//! # Teleoperation library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access the items
//! defined inside the teleoperation executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Analog sources - provide the raw readings of the operator's input
pub mod analog;

/// Parameters for the teleoperation executable
pub mod params;

/// Teleoperation control module - turns raw readings into a smooth servo angle
pub mod teleop_ctrl;
