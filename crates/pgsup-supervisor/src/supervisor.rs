//! Deadline-scoped process supervisor.
//!
//! One call to [`Supervisor::run`] launches a command into a new process
//! group, races its completion against the deadline and reports exactly one
//! [`Outcome`]. When the deadline wins, the whole group is killed once and
//! the late completion is drained in the background.

use crate::config::SupervisorOptions;
use crate::outcome::Outcome;
use crate::racer::CompletionWaiter;
use once_cell::sync::OnceCell;
use pgsup_common::{ProcessError, ProcessGroupId, ProcessResult};
use pgsup_process::{
    launch, native_terminator, validate_command, validate_deadline, CommandSpec, GroupTerminator,
    TerminationReport,
};
use pgsup_supervision_state::{StateTransition, SupervisionStateMachine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long a timed-out call keeps draining the killed child's completion.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime shared by every blocking caller, so background drains keep
/// running after `run_blocking` returns.
static BLOCKING_RUNTIME: OnceCell<tokio::runtime::Runtime> = OnceCell::new();

/// A command plus the deadline it must finish within.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisionRequest {
    pub command: CommandSpec,
    /// Measured from the moment the process is launched.
    pub deadline: Duration,
}

impl SupervisionRequest {
    pub fn new(command: CommandSpec, deadline: Duration) -> Self {
        Self { command, deadline }
    }

    pub fn validate(&self) -> ProcessResult<()> {
        validate_deadline(self.deadline)?;
        validate_command(&self.command)
    }
}

/// Everything the caller learns from one supervision call.
#[derive(Debug, Clone)]
pub struct SupervisionReport {
    pub outcome: Outcome,
    /// Leader PID, absent when the launch failed.
    pub pid: Option<u32>,
    pub group: Option<ProcessGroupId>,
    /// Wall time from the start of the call until the outcome was fixed.
    pub elapsed: Duration,
    /// True only when the deadline expired and a group kill was attempted.
    pub terminator_invoked: bool,
    pub history: Vec<StateTransition>,
}

/// Owns the kill of one process group until the race has a winner.
///
/// Dropping an armed guard kills the group, so a `run` future that is
/// cancelled mid-race (wrapped in a timeout, a `select!` or an aborted task)
/// never leaves the child running without a deadline.
struct GroupKillGuard {
    terminator: Arc<dyn GroupTerminator>,
    group: ProcessGroupId,
    label: String,
    armed: bool,
}

impl GroupKillGuard {
    fn new(terminator: Arc<dyn GroupTerminator>, group: ProcessGroupId, label: &str) -> Self {
        Self {
            terminator,
            group,
            label: label.to_string(),
            armed: true,
        }
    }

    /// The child completed on its own; nothing left to kill.
    fn disarm(mut self) {
        self.armed = false;
    }

    /// The deadline won: make the one termination attempt now.
    fn fire(mut self) {
        self.armed = false;
        terminate_group(self.terminator.as_ref(), &self.label, self.group);
    }
}

impl Drop for GroupKillGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                "Supervision of {} abandoned before the race finished; killing process group {}",
                self.label, self.group
            );
            terminate_group(self.terminator.as_ref(), &self.label, self.group);
        }
    }
}

enum RaceWinner {
    Completion(Result<crate::racer::Completion, tokio::sync::oneshot::error::RecvError>),
    Deadline,
}

/// Runs commands under a deadline.
///
/// Calls are independent: each owns its child, its group and its timer.
/// The only thing shared between calls is the live-waiter counter.
#[derive(Clone)]
pub struct Supervisor {
    terminator: Arc<dyn GroupTerminator>,
    drain_timeout: Duration,
    live_waiters: Arc<AtomicUsize>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("scope", &self.terminator.scope())
            .field("drain_timeout", &self.drain_timeout)
            .field("live_waiters", &self.active_waiters())
            .finish()
    }
}

impl Supervisor {
    /// Supervisor using the strongest terminator the host offers.
    pub fn new() -> Self {
        Self {
            terminator: native_terminator(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            live_waiters: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_options(options: &SupervisorOptions) -> Self {
        Self::new().with_drain_timeout(options.drain_timeout)
    }

    /// Substitute how process groups are terminated.
    pub fn with_terminator(mut self, terminator: Arc<dyn GroupTerminator>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Number of background waiter tasks still alive across all calls.
    pub fn active_waiters(&self) -> usize {
        self.live_waiters.load(Ordering::SeqCst)
    }

    /// Supervise one command until it completes or its deadline expires.
    ///
    /// Returns `Err` only for an invalid request or an internal failure of
    /// the supervisor; every result of the child itself is an [`Outcome`].
    pub async fn run(&self, request: SupervisionRequest) -> ProcessResult<SupervisionReport> {
        request.validate()?;

        let label = request.command.label().to_string();
        let started = Instant::now();
        let mut state = SupervisionStateMachine::new(&label);

        let launched = match launch(&request.command) {
            Ok(launched) => launched,
            Err(e) => {
                warn!("Launch of {} failed: {}", label, e);
                state.transition_to_reported(format!("Launch failed: {}", e))?;
                return Ok(SupervisionReport {
                    outcome: Outcome::LaunchFailed(e),
                    pid: None,
                    group: None,
                    elapsed: started.elapsed(),
                    terminator_invoked: false,
                    history: state.into_history(),
                });
            }
        };

        let group = launched.group();
        let pid = launched.pid();
        let deadline = deadline_from_now(request.deadline);
        let guard = GroupKillGuard::new(self.terminator.clone(), group, &label);
        state.transition_to_launched(pid)?;

        let mut waiter =
            CompletionWaiter::spawn(launched.into_child(), &label, self.live_waiters.clone());
        state.transition_to_racing()?;

        debug!(
            "Racing {} (PID: {}) against deadline of {:?}",
            label, pid, request.deadline
        );

        // The timer lives only inside this select and is dropped on either branch.
        let winner = tokio::select! {
            biased;
            completion = &mut waiter.receiver => RaceWinner::Completion(completion),
            _ = tokio::time::sleep_until(deadline) => RaceWinner::Deadline,
        };

        let (outcome, terminator_invoked) = match winner {
            RaceWinner::Completion(Ok(completion)) => {
                guard.disarm();
                state.transition_to_completed()?;
                (Outcome::from_completion(completion), false)
            }
            RaceWinner::Completion(Err(_)) => {
                // The waiter dropped its sender without publishing. Its child
                // is unsupervised now, so the guard still kills the group.
                drop(guard);
                return Err(match waiter.join_failure().await {
                    Some(message) => ProcessError::task_panic(&label, message),
                    None => ProcessError::completion_channel_closed(&label),
                });
            }
            RaceWinner::Deadline => {
                info!("Deadline of {:?} expired for {}", request.deadline, label);
                guard.fire();
                waiter.drain_in_background(self.drain_timeout);
                state.transition_to_killed()?;
                (Outcome::TimedOut, true)
            }
        };

        let elapsed = started.elapsed();
        state.transition_to_reported(outcome.to_string())?;
        info!(
            "Supervision of {} (PID: {}) finished: {} after {:?}",
            label,
            pid,
            outcome.kind(),
            elapsed
        );

        Ok(SupervisionReport {
            outcome,
            pid: Some(pid),
            group: Some(group),
            elapsed,
            terminator_invoked,
            history: state.into_history(),
        })
    }

    /// Blocking form of [`Supervisor::run`] for callers without a runtime.
    ///
    /// Must not be called from inside an async runtime.
    pub fn run_blocking(&self, request: SupervisionRequest) -> ProcessResult<SupervisionReport> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ProcessError::runtime_unavailable(
                "run_blocking called from within an async runtime; use run().await",
            ));
        }
        blocking_runtime()?.block_on(self.run(request))
    }
}

/// One termination attempt. Failures are logged only: by the time the group
/// is killed the outcome no longer depends on the child.
fn terminate_group(terminator: &dyn GroupTerminator, label: &str, group: ProcessGroupId) {
    let scope = terminator.scope();
    if !scope.covers_descendants() {
        warn!(
            "Termination scope on this host is {}; descendants of {} are not covered",
            scope, label
        );
    }

    match terminator.terminate_group(group) {
        Ok(TerminationReport::Signalled) => {
            info!("Killed process group {} of {}", group, label);
        }
        Ok(TerminationReport::AlreadyExited) => {
            debug!("Process group {} of {} had already exited", group, label);
        }
        Err(e) => {
            warn!("Failed to kill process group {} of {}: {}", group, label, e);
        }
    }
}

/// Deadlines too far out for the clock saturate to roughly thirty years.
fn deadline_from_now(deadline: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(deadline).unwrap_or_else(|| now + FAR_FUTURE)
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn blocking_runtime() -> ProcessResult<&'static tokio::runtime::Runtime> {
    BLOCKING_RUNTIME.get_or_try_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("pgsup-supervisor")
            .enable_all()
            .build()
            .map_err(|e| ProcessError::runtime_unavailable(e.to_string()))
    })
}
