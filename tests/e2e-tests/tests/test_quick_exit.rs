//! Scenario B: Quick Exit
//!
//! A child that finishes before its deadline is reported as a success with
//! its captured output, and the terminator never runs.

use e2e_tests::assertions::{assert_elapsed_between, assert_outcome};
use e2e_tests::TestExecutor;

#[test]
fn test_quick_exit() {
    println!("\n========================================");
    println!("TEST: Quick Exit");
    println!("========================================\n");

    let executor = TestExecutor::new("quick-exit");

    let result = (|| {
        let result = executor.run_testexe("1000ms", &["--stdout", "hello from testexe"])?;
        println!("Summary: {}\n", result.summary);

        assert_outcome(&result, "success", 0)?;
        assert_elapsed_between(&result, 0, 999)?;
        if result.terminator_invoked() {
            return Err("Terminator invoked for a child that exited on its own".to_string());
        }
        if result.summary["stdout"].as_str().map(str::trim) != Some("hello from testexe") {
            return Err(format!("Unexpected stdout: {}", result.summary["stdout"]));
        }

        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

#[test]
fn test_non_zero_exit() {
    let executor = TestExecutor::new("non-zero-exit");

    let result = executor
        .run_testexe("5s", &["--exit-code", "7"])
        .unwrap_or_else(|e| panic!("{}", e));

    if let Err(e) = assert_outcome(&result, "runtime_failed", 7) {
        panic!("Test failed: {}", e);
    }
    assert_eq!(result.summary["exit_code"], 7);
}
