//! Process launch primitives.
//!
//! A launched command always starts as the leader of a brand new process
//! group, so that the whole group can later be signalled without touching
//! the supervisor's own group.

use pgsup_common::ProcessGroupId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Everything needed to start one external program.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Executable path or a name resolved through `PATH`.
    pub executable: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    /// Extra environment variables layered on top of the inherited ones.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
}

impl CommandSpec {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Short human-readable label used in logs and error ids.
    pub fn label(&self) -> &str {
        &self.executable
    }
}

/// Why a command could not be started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Executable not found: {executable}")]
    NotFound { executable: String },

    #[error("Permission denied launching {executable}: {reason}")]
    PermissionDenied { executable: String, reason: String },

    #[error("Failed to launch {executable} ({kind:?}): {reason}")]
    Spawn {
        executable: String,
        kind: std::io::ErrorKind,
        reason: String,
    },

    #[error("Launched {executable} but the host reported no PID")]
    MissingPid { executable: String },
}

impl LaunchError {
    fn from_io(executable: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                executable: executable.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                executable: executable.to_string(),
                reason: err.to_string(),
            },
            kind => Self::Spawn {
                executable: executable.to_string(),
                kind,
                reason: err.to_string(),
            },
        }
    }
}

/// A child that has been started as the leader of its own process group.
#[derive(Debug)]
pub struct LaunchedProcess {
    group: ProcessGroupId,
    child: Child,
}

impl LaunchedProcess {
    /// PID of the leader, which is also the group id.
    pub fn pid(&self) -> u32 {
        self.group.as_raw()
    }

    pub fn group(&self) -> ProcessGroupId {
        self.group
    }

    /// Releases the child handle so it can be moved onto a waiter task.
    pub fn into_child(self) -> Child {
        self.child
    }
}

/// Start `spec` detached into a new process group.
///
/// stdout and stderr are piped for capture, stdin is closed.
pub fn launch(spec: &CommandSpec) -> Result<LaunchedProcess, LaunchError> {
    let mut cmd = Command::new(&spec.executable);
    cmd.args(&spec.args);

    if let Some(ref wd) = spec.working_directory {
        cmd.current_dir(wd);
    }

    for (key, value) in &spec.environment {
        cmd.env(key, value);
    }

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null());

    // Group id 0 asks the kernel to make the child its own group leader.
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }

    let child = cmd
        .spawn()
        .map_err(|e| LaunchError::from_io(&spec.executable, e))?;

    let pid = child.id().ok_or_else(|| LaunchError::MissingPid {
        executable: spec.executable.clone(),
    })?;

    let group = ProcessGroupId::from_leader_pid(pid);
    info!("Launched {} (PID: {}, group: {})", spec.executable, pid, group);
    debug!("Launch arguments for {}: {:?}", spec.executable, spec.args);

    Ok(LaunchedProcess {
        group,
        child,
    })
}
