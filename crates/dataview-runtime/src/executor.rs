//! The UI task loop.
//!
//! Every source runs its asynchronous work as a local task on one
//! [`UiLoop`]. Because the loop is single-threaded, tasks may own `Rc`
//! state and mutate observables directly; there is no hop back to a "main
//! thread" after a result arrives.
//!
//! Work that originates on other threads (platform callbacks, blocking
//! transports) reaches the loop through a [`Handoff`], which is `Send`.
//!
//! # Invariants
//!
//! 1. A task spawned through [`UiExecutor::spawn`] is aborted when its
//!    [`TaskGuard`] is dropped, unless the guard was detached.
//! 2. An aborted task never runs again; its future is dropped at the next
//!    poll.
//! 3. Closures posted to a [`Handoff`] run on the loop in posting order.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Spawn refused | Loop already dropped | Logged at `warn`; guard is inert |
//! | Post refused | Loop dropped | [`RuntimeError::LoopClosed`] |

use std::fmt;
use std::future::Future;

use futures::channel::mpsc;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{AbortHandle, abortable};
use futures::task::LocalSpawnExt;
use futures::StreamExt;

/// Errors from the task loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The loop that would run the work has been dropped.
    #[error("UI loop is closed")]
    LoopClosed,
}

type Job = Box<dyn FnOnce() + Send>;

// ---------------------------------------------------------------------------
// UiLoop
// ---------------------------------------------------------------------------

/// Owner of the local task pool.
///
/// Tests drive it explicitly with [`UiLoop::run_until_stalled`]; an
/// application calls it from its event loop after each platform event.
pub struct UiLoop {
    pool: LocalPool,
    jobs: mpsc::UnboundedSender<Job>,
    _drain: TaskGuard,
}

impl UiLoop {
    /// New loop with its handoff queue installed.
    #[must_use]
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let executor = UiExecutor {
            spawner: pool.spawner(),
        };
        let (jobs, mut inbox) = mpsc::unbounded::<Job>();
        let drain = executor.spawn(async move {
            while let Some(job) = inbox.next().await {
                job();
            }
        });
        Self {
            pool,
            jobs,
            _drain: drain,
        }
    }

    /// Spawn handle for this loop.
    #[must_use]
    pub fn executor(&self) -> UiExecutor {
        UiExecutor {
            spawner: self.pool.spawner(),
        }
    }

    /// Thread-safe entry point for this loop.
    #[must_use]
    pub fn handoff(&self) -> Handoff {
        Handoff {
            jobs: self.jobs.clone(),
        }
    }

    /// Run every task until none can make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Run tasks until `future` completes, returning its output.
    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }
}

impl Default for UiLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UiLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiLoop").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// UiExecutor
// ---------------------------------------------------------------------------

/// Cloneable handle that spawns onto a [`UiLoop`].
#[derive(Clone)]
pub struct UiExecutor {
    spawner: LocalSpawner,
}

impl UiExecutor {
    /// Spawn `future` as a cancellable local task.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> TaskGuard {
        let (task, handle) = abortable(future);
        match self.spawner.spawn_local(async move {
            let _ = task.await;
        }) {
            Ok(()) => TaskGuard {
                handle: Some(handle),
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to spawn UI task");
                handle.abort();
                TaskGuard { handle: None }
            }
        }
    }
}

impl fmt::Debug for UiExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiExecutor").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// TaskGuard
// ---------------------------------------------------------------------------

/// Aborts its task on drop.
#[must_use = "dropping a TaskGuard cancels the task"]
#[derive(Debug, Default)]
pub struct TaskGuard {
    handle: Option<AbortHandle>,
}

impl TaskGuard {
    /// A guard with no task behind it.
    pub fn none() -> Self {
        Self { handle: None }
    }

    /// Abort the task now.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Let the task run to completion regardless of the guard.
    pub fn detach(mut self) {
        self.handle = None;
    }

    /// Whether a task is still attached to this guard.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_aborted())
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Handoff
// ---------------------------------------------------------------------------

/// `Send` handle that queues closures onto a [`UiLoop`].
#[derive(Clone)]
pub struct Handoff {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Handoff {
    /// Queue `job` to run on the loop.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> Result<(), RuntimeError> {
        self.jobs
            .unbounded_send(Box::new(job))
            .map_err(|_| RuntimeError::LoopClosed)
    }
}

impl fmt::Debug for Handoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handoff")
            .field("closed", &self.jobs.is_closed())
            .finish()
    }
}
