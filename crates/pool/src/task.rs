//! The task record bookkeeping entry and the submission-queue entry type.

use crate::cancellation::CancellationToken;
use std::fmt;

/// Identifier for a submitted task.
///
/// Strictly increasing within a single [`Pool`](crate::Pool) instance and
/// never reused, per the monotone-ids invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// Reconstruct a `TaskId` from a raw value, e.g. one parsed from a
    /// user-supplied string. The pool itself never exposes a way to
    /// construct an id out of thin air other than via submission; this is
    /// for callers (like a CLI) that received the numeric value earlier
    /// and need to refer back to it.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier for a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub(crate) u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A user task: opaque, side-effectful, fire-and-forget.
///
/// Tasks that want to be cooperatively cancellable accept a
/// [`CancellationToken`] and poll it (directly, or via
/// [`CancellationToken::cancelled_sleep`]) at a checkpoint.
pub type Task = Box<dyn FnOnce(&CancellationToken) + Send + 'static>;

/// How a task's execution ended. Advisory only — fed to the observer, never
/// returned to the submitter (tasks are fire-and-forget).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task ran to completion without observing cancellation.
    Completed,
    /// The task panicked; the worker caught it and returned to idle.
    Panicked,
    /// The task observed the cooperative cancellation signal and unwound.
    Cancelled,
}

/// An entry in the submission queue: a task paired with its assigned id.
pub(crate) struct QueueEntry {
    pub(crate) id: TaskId,
    pub(crate) task: Task,
}
