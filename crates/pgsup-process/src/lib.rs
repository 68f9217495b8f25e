//! # pgsup Process
//!
//! Low-level process operations used by the deadline supervisor.
//!
//! This crate provides the host-facing primitives for:
//! - Launching a command into its own process group
//! - Group-directed forced termination
//! - Process and process-group liveness checks
//! - Request validation

pub mod check;
pub mod execute;
pub mod terminate;
pub mod validation;

// Re-export main types
pub use check::*;
pub use execute::*;
pub use terminate::*;
pub use validation::*;
