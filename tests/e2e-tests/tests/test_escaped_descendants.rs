//! Scenario C: Descendants
//!
//! A grandchild that stays in the child's process group dies with it on
//! timeout. When the parent exits first the race is over and the grandchild
//! is left alone, whether it stayed in the group or not. A grandchild that
//! moved into its own process group is out of reach of the group kill
//! either way; that is a known limitation.

use e2e_tests::assertions::{
    assert_outcome, assert_process_alive, assert_process_gone, read_pid_file,
};
use e2e_tests::TestExecutor;
use std::time::Duration;

#[cfg(unix)]
fn kill_leftover(pid: u32) {
    let _ = nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGKILL,
    );
}

#[test]
#[cfg(unix)]
fn test_grandchild_in_group_is_killed() {
    println!("\n========================================");
    println!("TEST: Grandchild In Group");
    println!("========================================\n");

    let executor = TestExecutor::new("grandchild-in-group");
    let child_pid_file = executor.path("grandchild.pid");
    let child_pid_arg = child_pid_file.to_string_lossy().to_string();

    let result = executor
        .run_testexe(
            "500ms",
            &[
                "--run-duration-ms",
                "5000",
                "--spawn-child-ms",
                "10000",
                "--child-pid-file",
                &child_pid_arg,
            ],
        )
        .and_then(|result| {
            println!("Summary: {}\n", result.summary);
            assert_outcome(&result, "timed_out", 124)?;

            let grandchild = read_pid_file(&child_pid_file)?;
            println!("Step 2: Checking grandchild {} is gone...", grandchild);
            let gone = assert_process_gone(grandchild, Duration::from_millis(500));
            if gone.is_err() {
                kill_leftover(grandchild);
            }
            gone
        });

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

#[test]
#[cfg(unix)]
fn test_parent_exit_ends_race_with_grandchild_in_group() {
    println!("\n========================================");
    println!("TEST: Parent Exits, Grandchild Stays In Group");
    println!("========================================\n");

    let executor = TestExecutor::new("grandchild-outlives-parent");
    let child_pid_file = executor.path("grandchild.pid");
    let child_pid_arg = child_pid_file.to_string_lossy().to_string();

    let result = executor
        .run_testexe(
            "500ms",
            &["--spawn-child-ms", "5000", "--child-pid-file", &child_pid_arg],
        )
        .and_then(|result| {
            println!("Summary: {}\n", result.summary);

            // Only the leader is raced; its exit ends the call before the deadline.
            assert_outcome(&result, "success", 0)?;
            if result.terminator_invoked() {
                return Err("Terminator invoked although the parent exited".to_string());
            }

            let grandchild = read_pid_file(&child_pid_file)?;
            let alive = assert_process_alive(grandchild);
            kill_leftover(grandchild);
            alive
        });

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

#[test]
#[cfg(unix)]
fn test_detached_grandchild_escapes() {
    println!("\n========================================");
    println!("TEST: Detached Grandchild");
    println!("========================================\n");

    let executor = TestExecutor::new("detached-grandchild");
    let child_pid_file = executor.path("grandchild.pid");
    let child_pid_arg = child_pid_file.to_string_lossy().to_string();

    let result = executor
        .run_testexe(
            "500ms",
            &[
                "--spawn-child-ms",
                "5000",
                "--detach-child",
                "--child-pid-file",
                &child_pid_arg,
            ],
        )
        .and_then(|result| {
            println!("Summary: {}\n", result.summary);

            // The parent exits at once, so the race ends before the deadline.
            assert_outcome(&result, "success", 0)?;
            if result.terminator_invoked() {
                return Err("Terminator invoked although the parent exited".to_string());
            }

            let grandchild = read_pid_file(&child_pid_file)?;
            let alive = assert_process_alive(grandchild);
            kill_leftover(grandchild);
            alive
        });

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}
