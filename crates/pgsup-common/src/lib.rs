//! # pgsup Common
//!
//! Error types and small identifier types shared by every pgsup crate.
//!
//! The supervisor, the low-level process primitives and the CLI all agree on
//! [`ProcessError`] for failures of the supervisor itself. Outcomes of the
//! supervised child (timeout, non-zero exit) are *not* errors and live in
//! `pgsup-supervisor`.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{ProcessError, ProcessResult};
pub use types::{ProcessGroupId, TerminationScope};
