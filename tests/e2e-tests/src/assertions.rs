//! Custom assertions for E2E tests

use crate::test_executor::RunResult;
use pgsup_common::ProcessGroupId;
use pgsup_process::{group_exists, process_exists};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Assert the reported outcome and the matching exit code
pub fn assert_outcome(result: &RunResult, outcome: &str, exit_code: i32) -> Result<(), String> {
    if result.outcome() != outcome {
        return Err(format!(
            "Expected outcome '{}', got '{}'. Summary: {}\nstderr:\n{}",
            outcome,
            result.outcome(),
            result.summary,
            result.stderr
        ));
    }

    if result.exit_code != Some(exit_code) {
        return Err(format!(
            "Expected exit code {}, got {:?}",
            exit_code, result.exit_code
        ));
    }

    Ok(())
}

/// Assert the supervisor's own elapsed time falls within a window
pub fn assert_elapsed_between(result: &RunResult, min_ms: u64, max_ms: u64) -> Result<(), String> {
    let elapsed = result.elapsed_ms();
    if elapsed < min_ms || elapsed > max_ms {
        return Err(format!(
            "Elapsed {}ms outside expected window [{}ms, {}ms]",
            elapsed, min_ms, max_ms
        ));
    }
    Ok(())
}

/// Poll until the process is gone
pub fn assert_process_gone(pid: u32, within: Duration) -> Result<(), String> {
    let start = Instant::now();
    loop {
        match process_exists(pid) {
            Ok(false) => return Ok(()),
            Ok(true) if start.elapsed() >= within => {
                return Err(format!("Process {} still alive after {:?}", pid, within));
            }
            Ok(true) => thread::sleep(Duration::from_millis(20)),
            Err(e) => return Err(format!("Failed to check process {}: {}", pid, e)),
        }
    }
}

/// Poll until no live member of the group remains
pub fn assert_group_gone(group: u32, within: Duration) -> Result<(), String> {
    let group = ProcessGroupId::from_leader_pid(group);
    let start = Instant::now();
    loop {
        match group_exists(group) {
            Ok(false) => return Ok(()),
            Ok(true) if start.elapsed() >= within => {
                return Err(format!("Process group {} still alive after {:?}", group, within));
            }
            Ok(true) => thread::sleep(Duration::from_millis(20)),
            Err(e) => return Err(format!("Failed to check group {}: {}", group, e)),
        }
    }
}

pub fn assert_process_alive(pid: u32) -> Result<(), String> {
    match process_exists(pid) {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("Process {} is not running", pid)),
        Err(e) => Err(format!("Failed to check process {}: {}", pid, e)),
    }
}

/// Read a PID written by testexe
pub fn read_pid_file(path: &Path) -> Result<u32, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read PID file {}: {}", path.display(), e))?;
    content
        .trim()
        .parse()
        .map_err(|e| format!("Invalid PID in {}: {}", path.display(), e))
}
