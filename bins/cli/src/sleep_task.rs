//! The demo workload driven by the `add <seconds>` REPL command.

use std::time::Duration;
use taskpool::CancellationToken;

/// Build a task that sleeps for `seconds`, waking early if cancelled.
///
/// This is the same shape as the original driver's demo workload: a task
/// with no real side effect beyond giving the REPL something worth racing
/// a `cancel` against.
pub fn sleep_task(seconds: u64) -> impl FnOnce(&CancellationToken) + Send + 'static {
    move |token: &CancellationToken| {
        token.cancelled_sleep(Duration::from_secs(seconds));
    }
}
