use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use tokio::time::sleep;
use tracing::{error, info};

/// Helper child program for pgsup end-to-end tests
#[derive(Parser, Debug)]
#[command(name = "testexe")]
#[command(about = "Test executable for deadline supervision testing", long_about = None)]
struct Args {
    /// Milliseconds to run before exiting (0 = exit at once)
    #[arg(long, default_value = "0")]
    run_duration_ms: u64,

    /// Exit code to return when done
    #[arg(long, default_value = "0")]
    exit_code: i32,

    /// Text to print on stdout before running
    #[arg(long)]
    stdout: Option<String>,

    /// Spawn a grandchild that runs for this many milliseconds
    #[arg(long)]
    spawn_child_ms: Option<u64>,

    /// Put the grandchild in its own process group so a group kill misses it
    #[arg(long)]
    detach_child: bool,

    /// PID file path to write this process's ID
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// PID file path to write the grandchild's ID
    #[arg(long)]
    child_pid_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // stdout is reserved for --stdout so tests can assert on it exactly.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let args = Args::parse();
    info!("Starting testexe with args: {:?}", args);

    if let Some(path) = &args.pid_file {
        if let Err(e) = atomic_write_text(path, &std::process::id().to_string()) {
            error!("Failed to write PID file {}: {}", path.display(), e);
            std::process::exit(1);
        }
        info!("Wrote PID to file: {}", path.display());
    }

    if let Some(child_ms) = args.spawn_child_ms {
        match spawn_grandchild(child_ms, args.detach_child) {
            Ok(pid) => {
                info!("Spawned grandchild {} (detached: {})", pid, args.detach_child);
                if let Some(path) = &args.child_pid_file {
                    if let Err(e) = atomic_write_text(path, &pid.to_string()) {
                        error!("Failed to write child PID file {}: {}", path.display(), e);
                        std::process::exit(1);
                    }
                }
            }
            Err(e) => {
                error!("Failed to spawn grandchild: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Some(text) = &args.stdout {
        println!("{}", text);
    }

    if args.run_duration_ms > 0 {
        sleep(Duration::from_millis(args.run_duration_ms)).await;
        info!("Run duration ({} ms) reached, exiting", args.run_duration_ms);
    }

    std::process::exit(args.exit_code);
}

/// Re-runs this executable as a sleeping grandchild.
///
/// The grandchild gets null stdio so it never holds the parent's output
/// pipes open after the parent exits.
fn spawn_grandchild(run_duration_ms: u64, detach: bool) -> std::io::Result<u32> {
    let mut cmd = std::process::Command::new(std::env::current_exe()?);
    cmd.arg("--run-duration-ms")
        .arg(run_duration_ms.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if detach {
            cmd.process_group(0);
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        if detach {
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }
    }

    let child = cmd.spawn()?;
    Ok(child.id())
}

fn atomic_write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "pid".to_string());

    // Write then rename, so readers polling for the file never see it half-written.
    let tmp_path = path.with_file_name(format!("{file_name}.tmp-{pid}-{nanos}"));
    std::fs::write(&tmp_path, contents)?;

    // Windows refuses to rename over an existing file.
    #[cfg(windows)]
    {
        let _ = std::fs::remove_file(path);
    }

    std::fs::rename(&tmp_path, path)
}
