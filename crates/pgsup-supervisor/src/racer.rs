//! Completion racer: the background half of a supervision call.
//!
//! Waiting for a child blocks until it exits, so it runs on its own task and
//! publishes the result once on a oneshot channel. The coordinating path
//! selects over that channel and the deadline timer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What the waiter publishes: captured output, or why waiting failed.
pub(crate) type Completion = std::io::Result<std::process::Output>;

/// Decrements the live-waiter count when the waiter task ends, whether it
/// finished, panicked or was aborted.
struct WaiterGuard(Arc<AtomicUsize>);

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Single-consumer handle on a background wait.
pub(crate) struct CompletionWaiter {
    label: String,
    pub(crate) receiver: oneshot::Receiver<Completion>,
    task: JoinHandle<()>,
}

impl CompletionWaiter {
    /// Moves `child` onto a new task that reaps it and collects its output.
    pub(crate) fn spawn(child: Child, label: &str, live_waiters: Arc<AtomicUsize>) -> Self {
        let (tx, rx) = oneshot::channel();

        live_waiters.fetch_add(1, Ordering::SeqCst);
        let guard = WaiterGuard(live_waiters);
        let task_label = label.to_string();

        let task = tokio::spawn(async move {
            let _guard = guard;
            let completion = child.wait_with_output().await;
            if tx.send(completion).is_err() {
                debug!("Completion of {} had no receiver", task_label);
            }
        });

        Self {
            label: label.to_string(),
            receiver: rx,
            task,
        }
    }

    /// Resolves the waiter task after its channel closed without a value.
    ///
    /// Returns the panic message if the task panicked.
    pub(crate) async fn join_failure(self) -> Option<String> {
        match self.task.await {
            Ok(()) => None,
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Some(message)
            }
            Err(_) => None,
        }
    }

    /// Drains a completion that lost the race, without blocking the caller.
    ///
    /// The late result is discarded. If the killed child still has not been
    /// reaped after `drain_timeout`, the waiter is aborted so the task does
    /// not outlive the bound; the child handle then goes to tokio's orphan
    /// reaper.
    pub(crate) fn drain_in_background(self, drain_timeout: Duration) {
        let CompletionWaiter {
            label,
            receiver,
            task,
        } = self;

        tokio::spawn(async move {
            match tokio::time::timeout(drain_timeout, receiver).await {
                Ok(Ok(Ok(output))) => {
                    debug!(
                        "Discarded late completion of {} (status: {})",
                        label, output.status
                    );
                }
                Ok(Ok(Err(e))) => {
                    debug!("Discarded late wait error of {}: {}", label, e);
                }
                Ok(Err(_)) => {
                    debug!("Waiter of {} ended without publishing", label);
                }
                Err(_) => {
                    warn!(
                        "Process {} not reaped within {:?} after kill; abandoning waiter",
                        label, drain_timeout
                    );
                    task.abort();
                }
            }
        });
    }
}
