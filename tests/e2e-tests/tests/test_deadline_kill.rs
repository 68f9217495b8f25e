//! Scenario A: Deadline Kill
//!
//! A child that outlives its deadline is reported as timed out and its whole
//! process group is gone shortly after the deadline.

use e2e_tests::assertions::{assert_elapsed_between, assert_group_gone, assert_outcome};
use e2e_tests::TestExecutor;
use std::time::Duration;

#[test]
#[cfg(unix)]
fn test_deadline_kill() {
    println!("\n========================================");
    println!("TEST: Deadline Kill");
    println!("========================================\n");

    let executor = TestExecutor::new("deadline-kill");

    let result = (|| {
        println!("Step 1: Running TESTEXE for 2000ms under a 1000ms deadline...");
        let result = executor.run_testexe("1000ms", &["--run-duration-ms", "2000"])?;
        println!("Summary: {}\n", result.summary);

        assert_outcome(&result, "timed_out", 124)?;
        assert_elapsed_between(&result, 1000, 1500)?;
        if !result.terminator_invoked() {
            return Err("Terminator was not invoked on timeout".to_string());
        }
        if result.wall_time >= Duration::from_millis(2000) {
            return Err(format!(
                "pgsup-run waited for the child: {:?}",
                result.wall_time
            ));
        }
        println!("✓ Timed out at the deadline\n");

        println!("Step 2: Checking the process group is gone...");
        let pid = result.pid().ok_or("Summary has no pid")?;
        assert_group_gone(pid, Duration::from_millis(500))?;
        println!("✓ Process group {} is gone\n", pid);

        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}
