use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use pgsup_supervisor::{Outcome, OutcomeKind, RuntimeError, SupervisionReport};

/// Exit code when the deadline expired (same as coreutils `timeout`).
pub const EXIT_TIMED_OUT: u8 = 124;

/// Exit code when the command could not be started.
pub const EXIT_LAUNCH_FAILED: u8 = 127;

/// Exit code for an invalid invocation or configuration.
pub const EXIT_USAGE: u8 = 2;

const EXIT_UNKNOWN: u8 = 1;

pub fn exit_code_for(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Success(_) => 0,
        Outcome::TimedOut => EXIT_TIMED_OUT,
        Outcome::LaunchFailed(_) => EXIT_LAUNCH_FAILED,
        Outcome::RuntimeFailed(RuntimeError::NonZeroExit { code, .. }) => {
            u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(EXIT_UNKNOWN)
        }
        Outcome::RuntimeFailed(RuntimeError::Signaled { signal, .. }) => {
            u8::try_from(128 + *signal).unwrap_or(EXIT_UNKNOWN)
        }
        Outcome::RuntimeFailed(RuntimeError::Wait { .. }) => EXIT_UNKNOWN,
    }
}

/// Machine-readable summary printed with `--json`.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_group: Option<u32>,
    pub elapsed_ms: u64,
    pub terminator_invoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn from_report(report: &SupervisionReport) -> Self {
        let output = report.outcome.output();
        let error = match &report.outcome {
            Outcome::Success(_) => None,
            Outcome::TimedOut => Some("deadline expired".to_string()),
            Outcome::LaunchFailed(e) => Some(e.to_string()),
            Outcome::RuntimeFailed(e) => Some(e.to_string()),
        };

        Self {
            outcome: report.outcome.kind(),
            pid: report.pid,
            process_group: report.group.map(|g| g.as_raw()),
            elapsed_ms: report.elapsed.as_millis() as u64,
            terminator_invoked: report.terminator_invoked,
            exit_code: output.and_then(|o| o.exit_code),
            stdout: output.map(|o| o.stdout_lossy()),
            stderr: output.map(|o| o.stderr_lossy()),
            error,
        }
    }

    /// Replays the child's captured output on our own streams, followed by a
    /// one-line diagnostic on stderr for anything but success.
    pub fn write_plain(&self, outcome: &Outcome, deadline: Duration) -> Result<()> {
        if let Some(output) = outcome.output() {
            std::io::stdout().write_all(&output.stdout)?;
            std::io::stderr().write_all(&output.stderr)?;
        }

        match outcome {
            Outcome::Success(_) => {}
            Outcome::TimedOut => {
                eprintln!("pgsup-run: timed out after {:?}", deadline);
            }
            Outcome::LaunchFailed(e) => {
                eprintln!("pgsup-run: {}", e);
            }
            Outcome::RuntimeFailed(e) => {
                eprintln!("pgsup-run: {}", e);
            }
        }

        std::io::stdout().flush()?;
        Ok(())
    }
}
