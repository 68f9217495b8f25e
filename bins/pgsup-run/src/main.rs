use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use pgsup_supervisor::config::duration_serde::parse_duration;
use pgsup_supervisor::{CommandSpec, SupervisionRequest, Supervisor, SupervisorConfig};

mod report;

use report::{exit_code_for, RunSummary, EXIT_USAGE};

/// Run a command under a hard deadline, killing its whole process group on expiry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Deadline, e.g. 500ms, 10s, 2m (overrides config)
    #[arg(short, long, value_name = "DURATION", value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// How long to keep draining a killed child before abandoning it
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    drain_timeout: Option<Duration>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print a JSON summary instead of the child's output
    #[arg(long)]
    json: bool,

    /// Executable and arguments (overrides the configured command)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("pgsup-run: {:#}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = match args.config {
        Some(ref path) => SupervisorConfig::load_from_file(path)?,
        None => SupervisorConfig::default(),
    };

    if let Some(drain_timeout) = args.drain_timeout {
        config.supervisor.drain_timeout = drain_timeout;
    }
    config.validate().context("Invalid command line overrides")?;

    initialize_logging(args.debug, &config.supervisor.log_level)?;

    let request = build_request(&args, &config)?;
    info!(
        "Supervising {} with deadline {:?}",
        request.command.executable, request.deadline
    );

    let supervisor = Supervisor::from_options(&config.supervisor);
    let deadline = request.deadline;
    let report = supervisor
        .run(request)
        .await
        .context("Supervision failed")?;

    let summary = RunSummary::from_report(&report);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.write_plain(&report.outcome, deadline)?;
    }

    Ok(ExitCode::from(exit_code_for(&report.outcome)))
}

fn build_request(args: &Args, config: &SupervisorConfig) -> Result<SupervisionRequest> {
    let mut request = match args.command.split_first() {
        Some((executable, rest)) => SupervisionRequest::new(
            CommandSpec::new(executable.as_str()).args(rest.iter().cloned()),
            config.supervisor.default_deadline,
        ),
        None => config
            .default_request()
            .ok_or_else(|| anyhow!("No command given and none configured"))?,
    };

    if let Some(timeout) = args.timeout {
        request.deadline = timeout;
    }

    Ok(request)
}

fn initialize_logging(debug: bool, configured_level: &str) -> Result<()> {
    let level = if debug { "debug" } else { configured_level };

    // stdout carries the child's output, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
