//! Worker identity and the two lifecycle flavors.

use std::time::Duration;

/// Whether a worker lives until shutdown (hot) or retires after sitting
/// idle for its timeout (elastic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerKind {
    /// Created eagerly at construction; ignores the idle timeout and waits
    /// indefinitely. Only retires during shutdown.
    Hot,
    /// Created on demand when a submit finds no idle worker; self-retires
    /// once it has waited `idle_timeout` without claiming a task.
    Elastic { idle_timeout: Duration },
}

/// Outcome of a worker's attempt to claim work, returned by
/// [`Scheduler::claim`](crate::scheduler::Scheduler::claim).
pub(crate) enum Claim {
    /// A task was claimed and assigned to the calling worker.
    Task {
        id: crate::task::TaskId,
        task: crate::task::Task,
        token: crate::cancellation::CancellationToken,
    },
    /// The pool is shutting down; the worker should exit its loop.
    Shutdown,
    /// An elastic worker's idle timeout elapsed with no work; it should
    /// exit its loop and self-retire.
    TimedOut,
}
