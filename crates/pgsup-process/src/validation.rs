//! Request validation utilities.
//!
//! Everything here runs before a process is launched, so a rejected request
//! never leaves a child or a timer behind.

use crate::CommandSpec;
use pgsup_common::{ProcessError, ProcessResult};
use std::time::Duration;

/// Validate that an executable path is usable as a launch target.
///
/// Existence is left to the launch itself, which reports a missing binary
/// as a launch failure.
pub fn validate_executable(path: &str) -> ProcessResult<()> {
    if path.trim().is_empty() {
        return Err(ProcessError::configuration(
            "validation",
            "Executable path cannot be empty",
        ));
    }

    if path.contains('\0') {
        return Err(ProcessError::configuration(
            path,
            "Executable path cannot contain NUL bytes",
        ));
    }

    Ok(())
}

/// Validate command arguments.
pub fn validate_args(executable: &str, args: &[String]) -> ProcessResult<()> {
    if let Some(index) = args.iter().position(|a| a.contains('\0')) {
        return Err(ProcessError::configuration(
            executable,
            format!("Argument {} contains a NUL byte", index),
        ));
    }
    Ok(())
}

/// Validate a supervision deadline. Zero is rejected.
pub fn validate_deadline(deadline: Duration) -> ProcessResult<()> {
    if deadline.is_zero() {
        return Err(ProcessError::configuration(
            "validation",
            "Deadline must be greater than zero",
        ));
    }
    Ok(())
}

/// Validate a whole command specification.
pub fn validate_command(spec: &CommandSpec) -> ProcessResult<()> {
    validate_executable(&spec.executable)?;
    validate_args(&spec.executable, &spec.args)?;

    if let Some(key) = spec
        .environment
        .keys()
        .find(|k| k.is_empty() || k.contains('=') || k.contains('\0'))
    {
        return Err(ProcessError::configuration(
            spec.executable.as_str(),
            format!("Invalid environment variable name: {:?}", key),
        ));
    }

    Ok(())
}
