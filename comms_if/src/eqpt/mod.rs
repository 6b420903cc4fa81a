//! # Equipment Interface
//!
//! This module defines the identifiers of the equipment (the arm's joints) shared between the
//! controller and its operators.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod joint;

pub use joint::{JointId, ParseJointError, ARM_JOINTS, NUM_JOINTS};
