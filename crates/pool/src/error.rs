//! Errors and outcomes surfaced by the pool facade.

use std::fmt;
use taskpool_shared::{ErrorCode, ErrorEnvelope};

/// Failure returned by [`Pool::submit`](crate::Pool::submit).
///
/// The only way submission fails: the pool has begun shutdown and no longer
/// admits new work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitError(ErrorEnvelope);

impl SubmitError {
    pub(crate) fn shutting_down() -> Self {
        Self(ErrorEnvelope::expected(
            ErrorCode::shutting_down(),
            "pool is shutting down; no new submissions are admitted",
        ))
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// The three possible outcomes of [`Pool::cancel`](crate::Pool::cancel).
///
/// Cancel never fails — it reports which of the mutually exclusive terminal
/// paths applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// No live record for this id: unknown task, already completed, or
    /// already cancelled. Callers must treat this as "terminal outcome
    /// already decided."
    NotFound,
    /// The task was still queued; it has been dropped and will never run.
    RemovedFromQueue,
    /// The task was already assigned to a worker; a cooperative interrupt
    /// was delivered to that worker.
    Terminated,
}

impl fmt::Display for CancelOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "NOT_FOUND",
            Self::RemovedFromQueue => "REMOVED_FROM_QUEUE",
            Self::Terminated => "TERMINATED",
        };
        formatter.write_str(label)
    }
}
