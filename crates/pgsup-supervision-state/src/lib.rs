use chrono::{DateTime, Utc};
use pgsup_common::errors::{ProcessError, ProcessResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single supervision call.
///
/// `Created → Launched → Racing → {Completed | Killed} → Reported`, with a
/// direct `Created → Reported` short-circuit when the launch itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisionState {
    /// Request accepted, nothing launched yet
    Created,
    /// Child is running in its own process group
    Launched,
    /// Completion and deadline are being raced
    Racing,
    /// Child finished on its own before the deadline
    Completed,
    /// Deadline won and the group was sent a kill
    Killed,
    /// Outcome handed back to the caller
    Reported,
}

impl fmt::Display for SupervisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisionState::Created => write!(f, "created"),
            SupervisionState::Launched => write!(f, "launched"),
            SupervisionState::Racing => write!(f, "racing"),
            SupervisionState::Completed => write!(f, "completed"),
            SupervisionState::Killed => write!(f, "killed"),
            SupervisionState::Reported => write!(f, "reported"),
        }
    }
}

/// State machine guarding the transitions of one supervision call
#[derive(Debug, Clone)]
pub struct SupervisionStateMachine {
    label: String,
    current_state: SupervisionState,
    state_history: Vec<StateTransition>,
}

/// Represents a state transition with timestamp and optional reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: SupervisionState,
    pub to_state: SupervisionState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

impl SupervisionStateMachine {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            current_state: SupervisionState::Created,
            state_history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> SupervisionState {
        self.current_state
    }

    /// Check if a transition from current state to target state is valid
    pub fn is_valid_transition(&self, target_state: SupervisionState) -> bool {
        use SupervisionState::*;

        matches!(
            (self.current_state, target_state),
            (Created, Launched)
                // Launch failure skips the race entirely
                | (Created, Reported)
                | (Launched, Racing)
                | (Racing, Completed)
                | (Racing, Killed)
                | (Completed, Reported)
                | (Killed, Reported)
        )
    }

    /// Transition to a new state with optional reason.
    ///
    /// Unlike a long-lived process, a supervision call never revisits a
    /// state, so self-transitions are rejected too.
    pub fn transition_to(
        &mut self,
        target_state: SupervisionState,
        reason: Option<String>,
    ) -> ProcessResult<()> {
        if !self.is_valid_transition(target_state) {
            return Err(ProcessError::invalid_state(
                &self.label,
                format!("{:?}", target_state),
                format!("{:?}", self.current_state),
            ));
        }

        let from_state = self.current_state;
        self.state_history.push(StateTransition {
            from_state,
            to_state: target_state,
            timestamp: Utc::now(),
            reason,
        });
        self.current_state = target_state;

        tracing::debug!(
            "Supervision of {} transitioned from {:?} to {:?}",
            self.label,
            from_state,
            target_state
        );

        Ok(())
    }

    pub fn transition_to_launched(&mut self, pid: u32) -> ProcessResult<()> {
        self.transition_to(
            SupervisionState::Launched,
            Some(format!("Process launched with PID {}", pid)),
        )
    }

    pub fn transition_to_racing(&mut self) -> ProcessResult<()> {
        self.transition_to(
            SupervisionState::Racing,
            Some("Racing completion against deadline".to_string()),
        )
    }

    pub fn transition_to_completed(&mut self) -> ProcessResult<()> {
        self.transition_to(
            SupervisionState::Completed,
            Some("Process completed before deadline".to_string()),
        )
    }

    pub fn transition_to_killed(&mut self) -> ProcessResult<()> {
        self.transition_to(
            SupervisionState::Killed,
            Some("Deadline expired, process group killed".to_string()),
        )
    }

    pub fn transition_to_reported(&mut self, reason: String) -> ProcessResult<()> {
        self.transition_to(SupervisionState::Reported, Some(reason))
    }

    /// Consumes the machine and returns its transition history.
    pub fn into_history(self) -> Vec<StateTransition> {
        self.state_history
    }
}
