//! The scheduler core: shared state plus the protocol linking submission,
//! assignment, cancellation, worker lifecycle, and shutdown.
//!
//! A single [`Mutex`] guards the task-record table, the submission queue,
//! the cancellation set, the idle set, the worker-handle table, and the
//! two id counters; a single [`Condvar`] coordinates every waiter. The lock
//! is held only for short bookkeeping sections — never while a task runs
//! and never while joining a worker thread.

use crate::cancellation::CancellationToken;
use crate::error::CancelOutcome;
use crate::queue::SubmissionQueue;
use crate::task::{QueueEntry, Task, TaskId, TaskOutcome, WorkerId};
use crate::worker::{Claim, WorkerKind};
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use taskpool_shared::{LogEvent, LogFields, LogLevel, Observer};

/// A live task's assignment state. Absence of an id from the table means
/// the task is terminal (completed, cancelled, or dropped at shutdown).
enum RecordState {
    Queued,
    Assigned {
        worker: WorkerId,
        token: CancellationToken,
    },
}

struct Inner {
    next_task_id: u64,
    next_worker_id: u64,
    queue: SubmissionQueue,
    records: HashMap<TaskId, RecordState>,
    cancellation_set: HashSet<TaskId>,
    idle: HashSet<WorkerId>,
    handles: HashMap<WorkerId, JoinHandle<()>>,
    shutting_down: bool,
    /// Number of worker ids reserved (inserted into `idle`) whose thread has
    /// not yet been spawned and handed back to [`register_handle`]. `shutdown`
    /// must not declare itself done while this is non-zero, or it could
    /// return before a just-reserved worker's thread is ever joined.
    pending_spawns: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            next_task_id: 0,
            next_worker_id: 0,
            queue: SubmissionQueue::new(),
            records: HashMap::new(),
            cancellation_set: HashSet::new(),
            idle: HashSet::new(),
            handles: HashMap::new(),
            shutting_down: false,
            pending_spawns: 0,
        }
    }
}

pub(crate) struct Scheduler {
    inner: Mutex<Inner>,
    condvar: Condvar,
    observer: Box<dyn Observer>,
}

impl Scheduler {
    pub(crate) fn new(observer: Box<dyn Observer>) -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
            condvar: Condvar::new(),
            observer,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        #[allow(clippy::unwrap_used, reason = "a poisoned scheduler mutex means a worker panicked while holding it, which only happens on a bug in this module; there is no recovery path")]
        self.inner.lock().unwrap()
    }

    fn emit(&self, event: &'static str, level: LogLevel, fields: LogFields) {
        self.observer.record(LogEvent { event, level, fields });
    }

    // ------------------------------------------------------------------
    // Pool-facade-facing operations
    // ------------------------------------------------------------------

    /// Enqueue `task` and return its id, plus the id of a new elastic
    /// worker the caller must spawn a thread for if no worker was idle at
    /// submission time. Returns `None` if shutdown has already begun,
    /// checked under the same lock as every other admission decision so
    /// there is no window where a submission can land after shutdown has
    /// finished draining the queue.
    ///
    /// The scheduler only reserves the worker id and marks it idle under
    /// the lock; it has no way to spawn an OS thread for it (that needs an
    /// `Arc<Scheduler>` clone, which `Pool` holds and this module does
    /// not). `Pool::submit` is responsible for actually spawning the
    /// thread and calling [`register_handle`](Self::register_handle).
    pub(crate) fn submit(&self, task: Task) -> Option<(TaskId, Option<WorkerId>)> {
        let mut state = self.lock();
        if state.shutting_down {
            return None;
        }

        let id = TaskId(state.next_task_id);
        state.next_task_id += 1;

        state.records.insert(id, RecordState::Queued);
        state.queue.push(QueueEntry { id, task });

        let mut fields = LogFields::new();
        fields.insert("task_id", id.to_string());
        self.emit("task.submitted", LogLevel::Info, fields);

        let new_worker = if state.idle.is_empty() {
            let worker_id = self.next_worker_id_locked(&mut state);
            state.idle.insert(worker_id);
            state.pending_spawns += 1;
            Some(worker_id)
        } else {
            None
        };

        self.condvar.notify_one();

        if let Some(worker_id) = new_worker {
            self.emit_worker_spawn(worker_id, "elastic");
        }

        Some((id, new_worker))
    }

    /// Reserve the id for an eagerly-created hot worker and mark it idle.
    /// Called once per hot worker from `Pool::new`, before any thread is
    /// spawned.
    pub(crate) fn reserve_hot_worker(&self) -> WorkerId {
        let mut state = self.lock();
        let worker_id = self.next_worker_id_locked(&mut state);
        state.idle.insert(worker_id);
        state.pending_spawns += 1;
        drop(state);
        self.emit_worker_spawn(worker_id, "hot");
        worker_id
    }

    /// Record the `JoinHandle` for a worker thread so `shutdown` can join
    /// it, and clear the reservation `submit`/`reserve_hot_worker` made for
    /// it. Must be called after the thread is spawned.
    ///
    /// A worker id is reserved (inserted into the idle set, counted in
    /// `pending_spawns`) before its thread exists, since the thread needs
    /// the id to run its loop. If `shutdown` raced in during that window it
    /// would otherwise drain an empty `handles` table and return without
    /// ever joining this worker. `shutdown` instead waits on the condvar
    /// while `pending_spawns` is non-zero and re-drains `handles` after
    /// every `register_handle` call, so it cannot finish until every
    /// reserved worker's handle has actually been registered and joined.
    pub(crate) fn register_handle(&self, worker_id: WorkerId, handle: JoinHandle<()>) {
        let mut state = self.lock();
        state.handles.insert(worker_id, handle);
        state.pending_spawns = state.pending_spawns.saturating_sub(1);
        drop(state);
        self.condvar.notify_all();
    }

    pub(crate) fn cancel(&self, id: TaskId) -> CancelOutcome {
        let mut state = self.lock();
        let mut fields = LogFields::new();
        fields.insert("task_id", id.to_string());

        let outcome = match state.records.get(&id) {
            None => CancelOutcome::NotFound,
            Some(RecordState::Queued) => {
                if state.cancellation_set.contains(&id) {
                    CancelOutcome::NotFound
                } else {
                    state.cancellation_set.insert(id);
                    CancelOutcome::RemovedFromQueue
                }
            },
            Some(RecordState::Assigned { worker, token }) => {
                fields.insert("worker_id", worker.to_string());
                token.cancel();
                CancelOutcome::Terminated
            },
        };

        fields.insert("outcome", outcome.to_string());
        self.emit("task.cancel_requested", LogLevel::Debug, fields);

        outcome
    }

    /// Begin shutdown, wake every waiter, and join every worker thread.
    /// Idempotent: a second (or concurrent) call observes `shutting_down`
    /// already set and simply waits for the first call's drain to finish.
    ///
    /// Joins in rounds rather than a single drain: a worker id can be
    /// reserved (and counted in `pending_spawns`) before its thread is
    /// spawned and its handle registered, so a single drain taken right as
    /// shutdown begins could miss a handle that is registered moments
    /// later. This loop keeps draining and waiting until both `handles` and
    /// `pending_spawns` are empty, which guarantees every worker that was
    /// ever reserved has been joined before returning — per spec.md §7,
    /// "all elastic and hot workers have exited before shutdown returns."
    pub(crate) fn shutdown(&self) {
        let mut state = self.lock();
        if !state.shutting_down {
            state.shutting_down = true;
            let dropped = state.queue.clear();
            for entry in dropped {
                state.records.remove(&entry.id);
            }
            state.cancellation_set.clear();
        }
        self.condvar.notify_all();

        loop {
            let handles: Vec<_> = state.handles.drain().collect();

            if handles.is_empty() {
                if state.pending_spawns == 0 {
                    return;
                }
                #[allow(clippy::unwrap_used, reason = "condvar wait only errs if the mutex was poisoned, which this module never causes")]
                {
                    state = self.condvar.wait(state).unwrap();
                }
                continue;
            }

            drop(state);
            for (worker_id, handle) in handles {
                #[allow(clippy::unwrap_used, reason = "a worker thread panicking is itself a bug this pool never produces; surfacing it by panicking shutdown is preferable to silently swallowing it")]
                handle.join().unwrap();
                let mut fields = LogFields::new();
                fields.insert("worker_id", worker_id.to_string());
                self.emit("worker.joined", LogLevel::Debug, fields);
            }
            state = self.lock();
        }
    }

    // ------------------------------------------------------------------
    // Worker-facing operations
    // ------------------------------------------------------------------

    /// The assignment protocol's steps 1-3: wait for work, skip queued
    /// cancellations, and either claim a task or exit.
    pub(crate) fn claim(&self, worker_id: WorkerId, kind: WorkerKind) -> Claim {
        let entry_time = Instant::now();
        let mut state = self.lock();

        loop {
            if state.shutting_down {
                state.idle.remove(&worker_id);
                return Claim::Shutdown;
            }

            if !state.queue.is_empty() {
                #[allow(clippy::unwrap_used, reason = "queue.is_empty() was just checked under the same lock")]
                let entry = state.queue.pop().unwrap();

                if state.cancellation_set.remove(&entry.id) {
                    state.records.remove(&entry.id);
                    let mut fields = LogFields::new();
                    fields.insert("task_id", entry.id.to_string());
                    self.emit("task.dropped_from_queue", LogLevel::Info, fields);
                    continue;
                }

                let token = CancellationToken::new();
                state.records.insert(
                    entry.id,
                    RecordState::Assigned {
                        worker: worker_id,
                        token: token.clone(),
                    },
                );
                state.idle.remove(&worker_id);

                let mut fields = LogFields::new();
                fields.insert("task_id", entry.id.to_string());
                fields.insert("worker_id", worker_id.to_string());
                self.emit("task.assigned", LogLevel::Debug, fields);

                return Claim::Task {
                    id: entry.id,
                    task: entry.task,
                    token,
                };
            }

            match kind {
                WorkerKind::Hot => {
                    #[allow(clippy::unwrap_used, reason = "condvar wait only errs if the mutex was poisoned, which this module never causes")]
                    {
                        state = self.condvar.wait(state).unwrap();
                    }
                },
                WorkerKind::Elastic { idle_timeout } => {
                    let elapsed = entry_time.elapsed();
                    if elapsed >= idle_timeout {
                        state.idle.remove(&worker_id);
                        return Claim::TimedOut;
                    }
                    let remaining = idle_timeout - elapsed;
                    #[allow(clippy::unwrap_used, reason = "condvar wait only errs if the mutex was poisoned, which this module never causes")]
                    {
                        let (guard, _timed_out) =
                            self.condvar.wait_timeout(state, remaining).unwrap();
                        state = guard;
                    }
                },
            }
        }
    }

    /// Re-acquire the lock after executing a task: rejoin the idle set and
    /// purge the completed record.
    pub(crate) fn unassign(&self, worker_id: WorkerId, id: TaskId, outcome: TaskOutcome) {
        let mut state = self.lock();
        state.records.remove(&id);
        state.idle.insert(worker_id);
        drop(state);

        let mut fields = LogFields::new();
        fields.insert("task_id", id.to_string());
        fields.insert("worker_id", worker_id.to_string());
        fields.insert("outcome", format!("{outcome:?}"));
        let level = match outcome {
            TaskOutcome::Completed | TaskOutcome::Cancelled => LogLevel::Info,
            TaskOutcome::Panicked => LogLevel::Warn,
        };
        self.emit("task.completed", level, fields);
    }

    /// Run `task` outside the lock, catching panics and cooperative
    /// cancellation, returning the outcome to feed back into `unassign`.
    pub(crate) fn execute(task: Task, token: &CancellationToken) -> TaskOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| task(token)));
        match result {
            Ok(()) if token.is_cancelled() => TaskOutcome::Cancelled,
            Ok(()) => TaskOutcome::Completed,
            Err(_) => TaskOutcome::Panicked,
        }
    }

    // ------------------------------------------------------------------
    // Worker lifecycle bookkeeping (must be called under `self.lock()`)
    // ------------------------------------------------------------------

    fn next_worker_id_locked(&self, state: &mut Inner) -> WorkerId {
        let id = WorkerId(state.next_worker_id);
        state.next_worker_id += 1;
        id
    }

    fn emit_worker_spawn(&self, worker_id: WorkerId, kind: &'static str) {
        let mut fields = LogFields::new();
        fields.insert("worker_id", worker_id.to_string());
        fields.insert("kind", kind.to_owned());
        self.emit("worker.spawned", LogLevel::Info, fields);
    }
}
