//! The single result of one supervision call.
//!
//! Exactly one [`Outcome`] is produced per call:
//!
//! | Race winner   | Child result             | Outcome                 |
//! |---------------|--------------------------|-------------------------|
//! | Completion    | success                  | `Success(output)`       |
//! | Completion    | non-zero / signal / wait | `RuntimeFailed(cause)`  |
//! | Deadline      | any                      | `TimedOut`              |
//! | (no race)     | launch failed            | `LaunchFailed(cause)`   |

use pgsup_process::LaunchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Bytes and exit code captured from a child that finished on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// `None` when the child was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// The child ran but did not finish successfully.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Process exited with code {code}")]
    NonZeroExit { code: i32, output: ProcessOutput },

    #[error("Process terminated by signal {signal}")]
    Signaled { signal: i32, output: ProcessOutput },

    #[error("Failed to wait for process: {reason}")]
    Wait { reason: String },
}

impl RuntimeError {
    /// Output captured before the failure, if the child was reaped normally.
    pub fn output(&self) -> Option<&ProcessOutput> {
        match self {
            RuntimeError::NonZeroExit { output, .. } | RuntimeError::Signaled { output, .. } => {
                Some(output)
            }
            RuntimeError::Wait { .. } => None,
        }
    }
}

/// Structured tag for [`Outcome`], so callers never match on error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    TimedOut,
    LaunchFailed,
    RuntimeFailed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::TimedOut => "timed_out",
            OutcomeKind::LaunchFailed => "launch_failed",
            OutcomeKind::RuntimeFailed => "runtime_failed",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one supervision call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Finished before the deadline with a success status.
    Success(ProcessOutput),

    /// The deadline won; the process group was sent a kill.
    TimedOut,

    /// The command never started. No race was entered.
    LaunchFailed(LaunchError),

    /// Finished before the deadline, but not successfully.
    RuntimeFailed(RuntimeError),
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success(_) => OutcomeKind::Success,
            Outcome::TimedOut => OutcomeKind::TimedOut,
            Outcome::LaunchFailed(_) => OutcomeKind::LaunchFailed,
            Outcome::RuntimeFailed(_) => OutcomeKind::RuntimeFailed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }

    /// Launch and runtime failures are call failures; success and timeout
    /// are both normal results of enforcing the deadline.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::LaunchFailed(_) | Outcome::RuntimeFailed(_))
    }

    /// Captured output, present only when the child completed on its own.
    pub fn output(&self) -> Option<&ProcessOutput> {
        match self {
            Outcome::Success(output) => Some(output),
            Outcome::RuntimeFailed(err) => err.output(),
            Outcome::TimedOut | Outcome::LaunchFailed(_) => None,
        }
    }

    /// Classify a natural completion published by the waiter task.
    pub(crate) fn from_completion(completion: std::io::Result<std::process::Output>) -> Self {
        let output = match completion {
            Ok(output) => output,
            Err(e) => {
                return Outcome::RuntimeFailed(RuntimeError::Wait {
                    reason: e.to_string(),
                })
            }
        };

        if output.status.success() {
            return Outcome::Success(output.into());
        }

        let status = output.status;
        if let Some(code) = status.code() {
            return Outcome::RuntimeFailed(RuntimeError::NonZeroExit {
                code,
                output: output.into(),
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Outcome::RuntimeFailed(RuntimeError::Signaled {
                    signal,
                    output: output.into(),
                });
            }
        }

        Outcome::RuntimeFailed(RuntimeError::Wait {
            reason: format!("Unrecognised exit status: {}", status),
        })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(_) => write!(f, "success"),
            Outcome::TimedOut => write!(f, "timed out"),
            Outcome::LaunchFailed(err) => write!(f, "launch failed: {}", err),
            Outcome::RuntimeFailed(err) => write!(f, "runtime failed: {}", err),
        }
    }
}
