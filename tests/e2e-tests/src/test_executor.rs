use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use super::{get_pgsup_run_path, get_testexe_path};

/// What one `pgsup-run --json` invocation produced
#[derive(Debug)]
pub struct RunResult {
    pub exit_code: Option<i32>,
    pub summary: serde_json::Value,
    pub stderr: String,
    pub wall_time: Duration,
}

impl RunResult {
    pub fn outcome(&self) -> &str {
        self.summary["outcome"].as_str().unwrap_or("<missing>")
    }

    pub fn pid(&self) -> Option<u32> {
        self.summary["pid"].as_u64().map(|pid| pid as u32)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.summary["elapsed_ms"].as_u64().unwrap_or(u64::MAX)
    }

    pub fn terminator_invoked(&self) -> bool {
        self.summary["terminator_invoked"].as_bool().unwrap_or(false)
    }
}

/// Runs testexe under pgsup-run inside a scratch directory
pub struct TestExecutor {
    pub test_name: String,
    pub test_dir: tempfile::TempDir,
    pub pgsup_run_path: PathBuf,
    pub testexe_path: PathBuf,
}

impl TestExecutor {
    pub fn new(test_name: &str) -> Self {
        let test_dir = tempfile::Builder::new()
            .prefix(&format!("pgsup-e2e-{}-", test_name))
            .tempdir()
            .expect("Failed to create test directory");
        let pgsup_run_path = get_pgsup_run_path();
        let testexe_path = get_testexe_path();

        println!("=== Test Executor Setup ===");
        println!("Test: {}", test_name);
        println!("Test dir: {}", test_dir.path().display());
        println!("PGSUP-RUN: {}", pgsup_run_path.display());
        println!("TESTEXE: {}", testexe_path.display());
        println!("===========================\n");

        Self {
            test_name: test_name.to_string(),
            test_dir,
            pgsup_run_path,
            testexe_path,
        }
    }

    /// Scratch file path inside the test directory
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.test_dir.path().join(file_name)
    }

    /// Supervise testexe with the given arguments and deadline
    pub fn run_testexe(&self, timeout: &str, testexe_args: &[&str]) -> Result<RunResult, String> {
        let testexe = self.testexe_path.to_string_lossy().to_string();
        let mut command = vec![testexe.as_str()];
        command.extend_from_slice(testexe_args);
        self.run(timeout, &command)
    }

    /// Supervise an arbitrary command with the given deadline
    pub fn run(&self, timeout: &str, command: &[&str]) -> Result<RunResult, String> {
        let start = Instant::now();
        let output = Command::new(&self.pgsup_run_path)
            .args(["--json", "--timeout", timeout, "--"])
            .args(command)
            .current_dir(self.test_dir.path())
            .output()
            .map_err(|e| format!("Failed to run pgsup-run: {}", e))?;
        let wall_time = start.elapsed();

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let summary = serde_json::from_slice(&output.stdout).map_err(|e| {
            format!(
                "pgsup-run printed no JSON summary ({}). stderr:\n{}",
                e, stderr
            )
        })?;

        Ok(RunResult {
            exit_code: output.status.code(),
            summary,
            stderr,
            wall_time,
        })
    }
}
