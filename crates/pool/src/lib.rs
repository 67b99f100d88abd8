//! A task-executing thread pool with cooperative cancellation and an
//! autoscaled idle-worker lifecycle.
//!
//! A [`Pool`] keeps a fixed number of "hot" worker threads alive for the
//! whole pool lifetime and spawns additional "elastic" workers on demand
//! when a submission finds every worker busy, retiring them after they sit
//! idle past their timeout. Submitted tasks run in FIFO order; cancelling a
//! queued task drops it before it ever runs, cancelling a running task
//! delivers a cooperative signal the task must itself observe.

mod cancellation;
mod error;
mod pool;
mod queue;
mod scheduler;
mod task;
mod worker;

pub use cancellation::CancellationToken;
pub use error::{CancelOutcome, SubmitError};
pub use pool::{Pool, PoolConfig};
pub use task::{Task, TaskId, TaskOutcome};
