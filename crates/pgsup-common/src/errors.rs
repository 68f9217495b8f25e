//! Error types for the supervisor.
//!
//! Only failures of the supervisor itself are modelled here: an invalid
//! request, a broken internal channel, a signal that could not be delivered.
//! A child that times out or exits non-zero is a normal outcome and is
//! reported through `Outcome`, never through [`ProcessError`].

use thiserror::Error;

/// Process-specific error types for supervision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Process stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    #[error("Process state error: {id} - expected {expected}, got {actual}")]
    InvalidState {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Process configuration error: {id} - {reason}")]
    Configuration { id: String, reason: String },

    #[error("Task panicked for process '{id}': {message}")]
    TaskPanic { id: String, message: String },

    #[error("Completion channel closed unexpectedly for process '{id}'")]
    CompletionChannelClosed { id: String },

    #[error("Async runtime unavailable: {reason}")]
    RuntimeUnavailable { reason: String },
}

impl ProcessError {
    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_state(
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn task_panic(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskPanic {
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn completion_channel_closed(id: impl Into<String>) -> Self {
        Self::CompletionChannelClosed { id: id.into() }
    }

    pub fn runtime_unavailable(reason: impl Into<String>) -> Self {
        Self::RuntimeUnavailable {
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the host.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
