//! Process-group termination primitives.
//!
//! On POSIX hosts the whole group is killed with one `kill(-pgid, SIGKILL)`.
//! Hosts without group-directed signals fall back to terminating the leader
//! only; see [`TerminationScope::SingleProcess`].

use pgsup_common::{ProcessError, ProcessGroupId, ProcessResult, TerminationScope};
use std::sync::Arc;

/// What a termination attempt found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReport {
    /// The kill signal was delivered to at least one member.
    Signalled,

    /// Nothing was left to signal; the group had already exited.
    AlreadyExited,
}

/// Capability to forcefully end every process in a group.
///
/// Implementations must treat an already-gone group as success
/// ([`TerminationReport::AlreadyExited`]): the desired end state holds.
pub trait GroupTerminator: Send + Sync {
    /// Send a forced, non-catchable termination to `group`.
    fn terminate_group(&self, group: ProcessGroupId) -> ProcessResult<TerminationReport>;

    /// How far a successful termination reaches on this host.
    fn scope(&self) -> TerminationScope;
}

/// Rejects ids that `kill(2)` would interpret as "own group" (0) or
/// "every process we may signal" (1, negated to -1).
fn checked_kill_target(group: ProcessGroupId) -> ProcessResult<i32> {
    let raw = group.as_raw();
    if raw <= 1 || raw > i32::MAX as u32 {
        return Err(ProcessError::stop_failed(
            group.to_string(),
            format!("Refusing to signal reserved process group id {}", raw),
        ));
    }
    Ok(group.kill_target())
}

/// SIGKILL to the negated group leader PID.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixGroupTerminator;

#[cfg(unix)]
impl GroupTerminator for PosixGroupTerminator {
    fn terminate_group(&self, group: ProcessGroupId) -> ProcessResult<TerminationReport> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let target = checked_kill_target(group)?;

        match kill(Pid::from_raw(target), Signal::SIGKILL) {
            Ok(()) => {
                tracing::debug!("Sent SIGKILL to process group {}", group);
                Ok(TerminationReport::Signalled)
            }
            Err(Errno::ESRCH) => {
                tracing::debug!("Process group {} already exited", group);
                Ok(TerminationReport::AlreadyExited)
            }
            Err(e) => Err(ProcessError::stop_failed(
                group.to_string(),
                format!("Failed to kill process group: {}", e),
            )),
        }
    }

    fn scope(&self) -> TerminationScope {
        TerminationScope::ProcessGroup
    }
}

/// Terminates the group leader only. Descendants keep running.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleProcessTerminator;

#[cfg(windows)]
impl GroupTerminator for SingleProcessTerminator {
    fn terminate_group(&self, group: ProcessGroupId) -> ProcessResult<TerminationReport> {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

        checked_kill_target(group)?;
        let pid = group.as_raw();

        unsafe {
            let handle = match OpenProcess(PROCESS_TERMINATE, false, pid) {
                Ok(h) if !h.is_invalid() => h,
                _ => {
                    // OpenProcess fails once the PID is gone.
                    if !crate::process_exists(pid).unwrap_or(true) {
                        return Ok(TerminationReport::AlreadyExited);
                    }
                    return Err(ProcessError::stop_failed(
                        pid.to_string(),
                        "Failed to open process for termination",
                    ));
                }
            };

            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);

            result
                .map(|_| TerminationReport::Signalled)
                .map_err(|e| ProcessError::stop_failed(
                    pid.to_string(),
                    format!("TerminateProcess failed: {}", e),
                ))
        }
    }

    fn scope(&self) -> TerminationScope {
        TerminationScope::SingleProcess
    }
}

/// The strongest terminator available on this host.
pub fn native_terminator() -> Arc<dyn GroupTerminator> {
    #[cfg(unix)]
    {
        Arc::new(PosixGroupTerminator)
    }

    #[cfg(windows)]
    {
        Arc::new(SingleProcessTerminator)
    }
}
