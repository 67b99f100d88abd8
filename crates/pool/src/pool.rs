//! The public pool facade tying the scheduler to spawned worker threads.

use crate::error::SubmitError;
use crate::scheduler::Scheduler;
use crate::task::{Task, TaskId, TaskOutcome};
use crate::worker::{Claim, WorkerKind};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use taskpool_shared::{NullObserver, Observer, Validate, ValidationError};

/// Validation failure for a [`PoolConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolConfigError {
    /// A numeric field is out of bounds.
    OutOfRange {
        /// Field name that failed validation.
        field: &'static str,
        /// Value provided (stringified).
        value: String,
        /// Inclusive minimum bound (stringified).
        min: String,
        /// Inclusive maximum bound (stringified).
        max: String,
    },
}

impl fmt::Display for PoolConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field, min, max, ..
            } => write!(formatter, "{field} must be between {min} and {max}"),
        }
    }
}

impl std::error::Error for PoolConfigError {}

impl ValidationError for PoolConfigError {
    fn empty(field: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value: String::new(),
            min: "1".to_owned(),
            max: "unbounded".to_owned(),
        }
    }

    fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value: reason.to_owned(),
            min: "1".to_owned(),
            max: "unbounded".to_owned(),
        }
    }

    fn out_of_range(field: &'static str, value: String, min: String, max: String) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }
}

/// Construction parameters for a [`Pool`].
///
/// `hot_workers` may be zero: a pool with no hot workers runs entirely on
/// elastic workers spawned on demand, at the cost of a thread-spawn's
/// latency on the first submission after every idle period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers created eagerly at construction and kept alive
    /// until shutdown, regardless of idle time.
    pub hot_workers: usize,
    /// How long an elastic worker waits for a task before retiring.
    pub elastic_idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            hot_workers: 1,
            elastic_idle_timeout: Duration::from_secs(30),
        }
    }
}

impl Validate for PoolConfig {
    type Error = PoolConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.elastic_idle_timeout.is_zero() {
            return Err(PoolConfigError::out_of_range(
                "elastic_idle_timeout",
                "0".to_owned(),
                "1ms".to_owned(),
                "unbounded".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A thread pool that runs submitted tasks on a mix of eagerly-created
/// "hot" workers and on-demand "elastic" workers, with cooperative
/// cancellation of both queued and running tasks.
///
/// `Pool` does not implement `Drop`: dropping it without calling
/// [`shutdown`](Self::shutdown) leaves every worker thread parked in its
/// assignment wait, since nothing else ever wakes them. Callers own the
/// pool's lifetime and must call `shutdown` to reclaim its threads.
pub struct Pool {
    scheduler: Arc<Scheduler>,
    idle_timeout: Duration,
}

impl Pool {
    /// Build a pool with the default configuration: a single hot worker
    /// and a 30-second elastic idle timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Build a pool from an explicit [`PoolConfig`], discarding observer
    /// events.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`Validate::validate`]; an invalid config is
    /// a programmer error, not a recoverable runtime condition.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self::with_config_and_observer(config, Box::new(NullObserver))
    }

    /// Build a pool from an explicit [`PoolConfig`], routing structured
    /// events to `observer`.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`Validate::validate`]; an invalid config is
    /// a programmer error, not a recoverable runtime condition.
    #[must_use]
    pub fn with_config_and_observer(config: PoolConfig, observer: Box<dyn Observer>) -> Self {
        #[allow(clippy::expect_used, reason = "an invalid PoolConfig is a programmer error the caller must fix, not a condition this constructor can recover from")]
        config.validate().expect("invalid PoolConfig");

        let scheduler = Arc::new(Scheduler::new(observer));

        for _ in 0..config.hot_workers {
            let worker_id = scheduler.reserve_hot_worker();
            let kind = WorkerKind::Hot;
            let thread_scheduler = Arc::clone(&scheduler);
            let handle = std::thread::spawn(move || worker_loop(thread_scheduler, worker_id, kind));
            scheduler.register_handle(worker_id, handle);
        }

        Self {
            scheduler,
            idle_timeout: config.elastic_idle_timeout,
        }
    }

    /// Submit `task` for execution, returning its id, unless the pool has
    /// begun shutdown.
    ///
    /// If no worker is currently idle, a new elastic worker is spawned to
    /// pick it up; whether that worker claims this exact task or a later
    /// one submitted before it wakes is unspecified, but some worker will
    /// claim it in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] if the pool is shutting down or has already
    /// shut down.
    pub fn submit<F>(&self, task: F) -> Result<TaskId, SubmitError>
    where
        F: FnOnce(&crate::cancellation::CancellationToken) + Send + 'static,
    {
        let Some((id, new_worker)) = self.scheduler.submit(Box::new(task) as Task) else {
            return Err(SubmitError::shutting_down());
        };

        if let Some(worker_id) = new_worker {
            let elastic_timeout = self.elastic_idle_timeout();
            let kind = WorkerKind::Elastic {
                idle_timeout: elastic_timeout,
            };
            let thread_scheduler = Arc::clone(&self.scheduler);
            let handle = std::thread::spawn(move || worker_loop(thread_scheduler, worker_id, kind));
            self.scheduler.register_handle(worker_id, handle);
        }

        Ok(id)
    }

    /// Request cancellation of `id`.
    ///
    /// See [`CancelOutcome`](crate::CancelOutcome) for the three possible
    /// results. Always returns promptly: for a running task this only
    /// delivers the cooperative signal, it does not wait for the task to
    /// observe it.
    pub fn cancel(&self, id: TaskId) -> crate::CancelOutcome {
        self.scheduler.cancel(id)
    }

    /// Stop admitting new submissions, drop everything still queued, let
    /// every running task finish (or observe cancellation on its own), and
    /// join every worker thread.
    ///
    /// Idempotent and safe to call more than once, including from
    /// multiple clones concurrently.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn elastic_idle_timeout(&self) -> Duration {
        // Stashing this on `Pool` instead of threading it through
        // `Scheduler` keeps the scheduler ignorant of wall-clock
        // configuration; `Pool` is the only place that needs it, to hand
        // freshly spawned elastic workers their timeout.
        self.idle_timeout
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_loop(scheduler: Arc<Scheduler>, worker_id: crate::task::WorkerId, kind: WorkerKind) {
    loop {
        match scheduler.claim(worker_id, kind) {
            Claim::Task { id, task, token } => {
                let outcome = Scheduler::execute(task, &token);
                scheduler.unassign(worker_id, id, outcome);
            },
            Claim::Shutdown | Claim::TimedOut => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_timeout() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.elastic_idle_timeout > Duration::ZERO);
    }

    #[test]
    fn zero_idle_timeout_fails_validation() {
        let config = PoolConfig {
            hot_workers: 1,
            elastic_idle_timeout: Duration::ZERO,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "invalid PoolConfig")]
    fn with_config_panics_on_invalid_config() {
        let config = PoolConfig {
            hot_workers: 1,
            elastic_idle_timeout: Duration::ZERO,
        };
        let _pool = Pool::with_config(config);
    }

    #[test]
    fn submit_runs_task_and_shutdown_joins_cleanly() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let pool = Pool::new();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        pool.submit(move |_token| ran_clone.store(true, Ordering::SeqCst))
            .expect("pool should accept submissions before shutdown");

        std::thread::sleep(Duration::from_millis(50));
        pool.shutdown();

        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn submit_after_shutdown_is_rejected() {
        let pool = Pool::new();
        pool.shutdown();

        let result = pool.submit(|_token| {});
        assert!(result.is_err());
    }
}
