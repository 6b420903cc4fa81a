//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the arm software: the joint identifiers,
//! the serial command protocol, and the serial link itself.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Serial command protocol and operator responses
pub mod tc;

/// Identifiers for equipment (the arm's joints)
pub mod eqpt;

/// Serial link module
pub mod serial;
