//! Process and process-group liveness checks.
//!
//! `kill(pid, 0)` succeeds for zombies, which makes it a poor answer to "is
//! anything still running?" right after a group kill. On Linux the checks
//! read `/proc` and ignore zombie and dead entries; elsewhere they fall back
//! to a signal-0 liveness check.

use pgsup_common::{ProcessError, ProcessGroupId, ProcessResult};

/// Check if a process with the given PID exists and is running.
///
/// # Returns
///
/// * `Ok(true)` - Process exists and is running
/// * `Ok(false)` - Process does not exist (or is a zombie on Linux)
/// * `Err(_)` - Error occurred while checking
///
/// # Examples
///
/// ```rust,no_run
/// use pgsup_process::process_exists;
///
/// if process_exists(1234).unwrap() {
///     println!("Process 1234 is running");
/// }
/// ```
pub fn process_exists(pid: u32) -> ProcessResult<bool> {
    #[cfg(target_os = "linux")]
    {
        match proc_stat(pid) {
            Ok(Some(stat)) => return Ok(stat.is_live()),
            Ok(None) => return Ok(false),
            // /proc unavailable: fall through to the signal check.
            Err(_) => {}
        }
    }

    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(windows)]
    {
        process_exists_windows(pid)
    }
}

/// Check whether any live process still belongs to `group`.
pub fn group_exists(group: ProcessGroupId) -> ProcessResult<bool> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(members) = live_group_members(group) {
            return Ok(!members.is_empty());
        }
    }

    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        match kill(Pid::from_raw(group.kill_target()), None) {
            Ok(_) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(Errno::EPERM) => Ok(true),
            Err(e) => Err(ProcessError::configuration(
                group.to_string(),
                format!("Failed to check process group: {}", e),
            )),
        }
    }

    #[cfg(windows)]
    {
        // No group-directed check; the leader is the best available proxy.
        process_exists(group.as_raw())
    }
}

/// PIDs of every non-zombie process whose process group is `group`.
#[cfg(target_os = "linux")]
pub fn live_group_members(group: ProcessGroupId) -> ProcessResult<Vec<u32>> {
    let entries = std::fs::read_dir("/proc").map_err(|e| {
        ProcessError::configuration(group.to_string(), format!("Failed to read /proc: {}", e))
    })?;

    let mut members = Vec::new();
    for entry in entries.flatten() {
        let pid = match entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) {
            Some(pid) => pid,
            None => continue,
        };
        // Processes can vanish between readdir and open.
        if let Ok(Some(stat)) = proc_stat(pid) {
            if stat.pgrp == group.as_raw() && stat.is_live() {
                members.push(pid);
            }
        }
    }
    Ok(members)
}

#[cfg(target_os = "linux")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProcStat {
    state: char,
    pgrp: u32,
}

#[cfg(target_os = "linux")]
impl ProcStat {
    fn is_live(&self) -> bool {
        !matches!(self.state, 'Z' | 'X' | 'x')
    }

    /// Parses `/proc/<pid>/stat`. The command name is wrapped in parentheses
    /// and may itself contain spaces or parentheses, so fields are read after
    /// the last `)`.
    fn parse(contents: &str) -> Option<Self> {
        let rest = &contents[contents.rfind(')')? + 1..];
        let mut fields = rest.split_whitespace();
        let state = fields.next()?.chars().next()?;
        let _ppid = fields.next()?;
        let pgrp = fields.next()?.parse().ok()?;
        Some(Self { state, pgrp })
    }
}

#[cfg(target_os = "linux")]
fn proc_stat(pid: u32) -> std::io::Result<Option<ProcStat>> {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(contents) => Ok(ProcStat::parse(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        // Reading a process that exits mid-read reports ESRCH.
        Err(e) if e.raw_os_error() == Some(nix::errno::Errno::ESRCH as i32) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> ProcessResult<bool> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let nix_pid = Pid::from_raw(pid as i32);

    match kill(nix_pid, None) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        Err(nix::errno::Errno::EPERM) => Ok(true), // exists, not ours to signal
        Err(e) => Err(ProcessError::configuration(
            pid.to_string(),
            format!("Failed to check process: {}", e),
        )),
    }
}

#[cfg(windows)]
fn process_exists_windows(pid: u32) -> ProcessResult<bool> {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        let handle: HANDLE = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(h) => h,
            Err(e) => {
                let error_code = e.code().0 as u32;
                const ERROR_INVALID_PARAMETER: u32 = 0x80070057;
                const ERROR_ACCESS_DENIED: u32 = 0x80070005;

                if error_code == ERROR_INVALID_PARAMETER || error_code == ERROR_ACCESS_DENIED {
                    return Ok(false);
                }
                return Err(ProcessError::configuration(
                    pid.to_string(),
                    format!("Failed to check process: {}", e),
                ));
            }
        };

        let _ = CloseHandle(handle);
        Ok(true)
    }
}
