//! # Arm library.
//!
//! This library allows other crates in the workspace (and the tests) to access the items defined
//! inside the arm executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - interprets arm commands and ramps the joints to their targets
pub mod arm_ctrl;

/// Parameters for the arm executable
pub mod params;
