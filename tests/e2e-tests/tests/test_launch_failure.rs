//! Scenario D: Launch Failure
//!
//! A missing executable is reported as a launch failure without entering the
//! race, so no pid is reported and the deadline never matters.

use e2e_tests::assertions::assert_outcome;
use e2e_tests::TestExecutor;
use std::time::Duration;

#[test]
fn test_launch_failure() {
    println!("\n========================================");
    println!("TEST: Launch Failure");
    println!("========================================\n");

    let executor = TestExecutor::new("launch-failure");
    let missing = executor.path("does-not-exist");
    let missing = missing.to_string_lossy().to_string();

    let result = executor
        .run("10s", &[missing.as_str()])
        .and_then(|result| {
            println!("Summary: {}\n", result.summary);
            assert_outcome(&result, "launch_failed", 127)?;

            if result.pid().is_some() {
                return Err("Launch failure reported a pid".to_string());
            }
            if result.terminator_invoked() {
                return Err("Terminator invoked without a child".to_string());
            }
            if result.wall_time >= Duration::from_secs(5) {
                return Err(format!("Launch failure waited: {:?}", result.wall_time));
            }
            Ok(())
        });

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}
