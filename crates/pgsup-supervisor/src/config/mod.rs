use anyhow::{Context, Result};
use pgsup_process::CommandSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::supervisor::{SupervisionRequest, DEFAULT_DRAIN_TIMEOUT};

pub mod validation;

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default)]
    pub supervisor: SupervisorOptions,

    /// Command to run when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandSpec>,
}

/// Supervisor options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorOptions {
    #[serde(default = "default_deadline", with = "duration_serde")]
    pub default_deadline: Duration,

    /// Bound on draining a killed child's late completion.
    #[serde(default = "default_drain_timeout", with = "duration_serde")]
    pub drain_timeout: Duration,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            default_deadline: default_deadline(),
            drain_timeout: default_drain_timeout(),
            log_level: default_log_level(),
        }
    }
}

fn default_deadline() -> Duration {
    Duration::from_secs(30)
}

fn default_drain_timeout() -> Duration {
    DEFAULT_DRAIN_TIMEOUT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SupervisorConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: SupervisorConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Request for the configured command, if any, using the default deadline.
    pub fn default_request(&self) -> Option<SupervisionRequest> {
        self.command
            .clone()
            .map(|command| SupervisionRequest::new(command, self.supervisor.default_deadline))
    }
}

/// Durations written as `"500ms"`, `"30s"` or `"2m"`.
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parse a duration with a `ms`, `s` or `m` suffix. Negative values are
    /// rejected by the parser; zero is left to validation.
    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        // Check for "ms" BEFORE "s" since "ms" ends with 's'
        let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
            (n, 1u64)
        } else if let Some(n) = s.strip_suffix('s') {
            (n, 1_000)
        } else if let Some(n) = s.strip_suffix('m') {
            (n, 60_000)
        } else {
            return Err(format!("Invalid duration (expected ms, s or m suffix): {}", s));
        };

        let value: u64 = num_str
            .trim()
            .parse()
            .map_err(|_| format!("Invalid duration: {}", s))?;
        let millis = value
            .checked_mul(unit)
            .ok_or_else(|| format!("Duration too large: {}", s))?;
        Ok(Duration::from_millis(millis))
    }
}
