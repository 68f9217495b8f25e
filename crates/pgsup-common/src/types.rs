//! Core domain types shared by the supervisor crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process group identifier.
///
/// A child launched into its own group becomes the group leader, so the
/// group id equals the leader's PID. The id is only meaningful between launch
/// and the moment the leader is reaped; signalling a stale id is a no-op.
///
/// # Example
/// ```
/// use pgsup_common::ProcessGroupId;
///
/// let group = ProcessGroupId::from_leader_pid(4242);
/// assert_eq!(group.as_raw(), 4242);
/// assert_eq!(group.kill_target(), -4242);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessGroupId(u32);

impl ProcessGroupId {
    /// Creates a group id from the PID of the group leader.
    pub fn from_leader_pid(pid: u32) -> Self {
        Self(pid)
    }

    /// Returns the raw group id (the leader's PID).
    pub fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the negated id that `kill(2)` interprets as "every member of
    /// this group".
    pub fn kill_target(&self) -> i32 {
        -(self.0 as i32)
    }
}

impl fmt::Display for ProcessGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How far a termination reaches on the current host.
///
/// POSIX hosts can signal a whole process group. Other hosts fall back to
/// terminating the leader only, which leaves descendants running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationScope {
    /// Every process still in the leader's group is signalled.
    ProcessGroup,

    /// Only the leader is terminated (reduced guarantee).
    SingleProcess,
}

impl TerminationScope {
    /// Returns true if descendants that stayed in the group are covered.
    pub fn covers_descendants(&self) -> bool {
        matches!(self, TerminationScope::ProcessGroup)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationScope::ProcessGroup => "process_group",
            TerminationScope::SingleProcess => "single_process",
        }
    }
}

impl fmt::Display for TerminationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
