use super::*;
use anyhow::{anyhow, Result};

/// Validate the complete configuration
pub fn validate_config(config: &SupervisorConfig) -> Result<()> {
    validate_supervisor_options(&config.supervisor)?;

    if let Some(ref command) = config.command {
        pgsup_process::validate_command(command)
            .map_err(|e| anyhow!("Invalid command configuration: {}", e))?;
    }

    Ok(())
}

/// Validate supervisor options
fn validate_supervisor_options(options: &SupervisorOptions) -> Result<()> {
    if options.default_deadline.is_zero() {
        return Err(anyhow!("Default deadline must be greater than 0"));
    }

    if options.drain_timeout.is_zero() {
        return Err(anyhow!("Drain timeout must be greater than 0"));
    }

    validate_log_level(&options.log_level)
}

pub fn validate_log_level(level: &str) -> Result<()> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(anyhow!(
            "Invalid log level: {}, must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}
