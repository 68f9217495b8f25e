// E2E Test Framework for pgsup-run

pub mod assertions;
pub mod test_executor;

pub use test_executor::{RunResult, TestExecutor};

use std::env;
use std::path::PathBuf;

/// Locate a workspace binary next to the running test executable
fn workspace_binary(name: &str) -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current exe path")
        .parent()
        .expect("Failed to get parent dir")
        .to_path_buf();

    // If we're in deps/, go up one level
    if path.ends_with("deps") {
        path.pop();
    }

    path.push(format!("{}{}", name, env::consts::EXE_SUFFIX));

    if !path.exists() {
        panic!(
            "{} binary not found at: {} (build the workspace first)",
            name,
            path.display()
        );
    }

    path
}

/// Get the path to the pgsup-run binary
pub fn get_pgsup_run_path() -> PathBuf {
    workspace_binary("pgsup-run")
}

/// Get the path to the TESTEXE (testexe) binary
pub fn get_testexe_path() -> PathBuf {
    workspace_binary("testexe")
}
