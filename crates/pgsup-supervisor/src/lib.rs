//! # pgsup Supervisor
//!
//! Runs an external command under a hard wall-clock deadline. The command is
//! started as the leader of a new process group; if the deadline expires
//! first, every process still in that group is killed with one signal.
//!
//! ```rust,no_run
//! use pgsup_supervisor::{CommandSpec, Outcome, SupervisionRequest, Supervisor};
//! use std::time::Duration;
//!
//! # async fn example() -> pgsup_common::ProcessResult<()> {
//! let supervisor = Supervisor::new();
//! let request = SupervisionRequest::new(
//!     CommandSpec::new("sh").args(["-c", "sleep 10"]),
//!     Duration::from_secs(1),
//! );
//!
//! let report = supervisor.run(request).await?;
//! assert!(matches!(report.outcome, Outcome::TimedOut));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod outcome;
mod racer;
pub mod supervisor;

pub use config::{SupervisorConfig, SupervisorOptions};
pub use outcome::{Outcome, OutcomeKind, ProcessOutput, RuntimeError};
pub use supervisor::{SupervisionReport, SupervisionRequest, Supervisor, DEFAULT_DRAIN_TIMEOUT};

pub use pgsup_process::{CommandSpec, GroupTerminator, LaunchError, TerminationReport};
