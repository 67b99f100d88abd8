//! Cooperative cancellation token.
//!
//! Cancellation in this pool is never preemptive: a running task is only
//! ever interrupted at a checkpoint it chooses to observe. Built on a plain
//! `AtomicBool` rather than an async notify handle, since no task here ever
//! awaits — it blocks, sleeps, or returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
}

/// A cloneable handle a running task can poll to observe cancellation.
///
/// Delivering the signal (`cancel`) never blocks and never fails — it is a
/// store to an atomic flag. Observing it is entirely the task's
/// responsibility; a task that never checkpoints is not cancelable while
/// running, exactly as specified.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
        }
    }

    /// Deliver the cooperative interrupt.
    ///
    /// Idempotent: cancelling an already-cancelled token is a no-op.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early and returning `true` if cancelled
    /// partway through. Returns `false` if the full duration elapsed without
    /// a cancellation.
    ///
    /// Implemented as short polling slices rather than a single blocking
    /// sleep so a task built on this primitive (the CLI's `sleep_task` demo)
    /// can honor cancellation mid-sleep without the scheduler needing any
    /// way to interrupt an OS-level sleep.
    #[must_use]
    pub fn cancelled_sleep(&self, duration: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(10);

        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            std::thread::sleep(remaining.min(SLICE));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent_and_visible_to_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        token.cancel();
        token.cancel();

        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancelled_sleep_returns_false_when_uninterrupted() {
        let token = CancellationToken::new();
        let interrupted = token.cancelled_sleep(Duration::from_millis(20));
        assert!(!interrupted);
    }

    #[test]
    fn cancelled_sleep_wakes_early_on_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();

        let handle = thread::spawn(move || waiter.cancelled_sleep(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(30));
        token.cancel();

        let interrupted = handle.join().expect("sleeper thread should not panic");
        assert!(interrupted);
    }
}
