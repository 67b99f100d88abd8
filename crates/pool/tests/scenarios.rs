//! End-to-end scenarios exercising submission, cancellation (queued and
//! running), elastic growth, shutdown with a backlog, and the cancel/
//! completion race, each run a handful of times to shake out timing-
//! dependent interleavings rather than relying on a single pass.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use taskpool::{CancelOutcome, Pool, PoolConfig};

fn quick_pool(hot_workers: usize) -> Pool {
    Pool::with_config(PoolConfig {
        hot_workers,
        elastic_idle_timeout: Duration::from_millis(60),
    })
}

#[test]
fn basic_submission_runs_to_completion() {
    let pool = quick_pool(2);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..20 {
        let counter = Arc::clone(&counter);
        pool.submit(move |_token| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("submission should be accepted");
    }

    std::thread::sleep(Duration::from_millis(200));
    pool.shutdown();

    assert_eq!(counter.load(Ordering::SeqCst), 20);
}

#[test]
fn cancelling_a_queued_task_prevents_it_from_running() {
    // A single hot worker holds one long task so every later submission
    // sits in the queue long enough to be cancelled before it is claimed.
    let pool = quick_pool(1);
    let holder_started = Arc::new(Barrier::new(2));
    let release_holder = Arc::new(AtomicBool::new(false));

    {
        let holder_started = Arc::clone(&holder_started);
        let release_holder = Arc::clone(&release_holder);
        pool.submit(move |token| {
            holder_started.wait();
            while !release_holder.load(Ordering::SeqCst) && !token.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
        })
        .expect("holder task should be accepted");
    }
    holder_started.wait();

    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = Arc::clone(&ran);
    let queued_id = pool
        .submit(move |_token| ran_clone.store(true, Ordering::SeqCst))
        .expect("queued task should be accepted");

    let outcome = pool.cancel(queued_id);
    assert_eq!(outcome, CancelOutcome::RemovedFromQueue);

    release_holder.store(true, Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(100));
    pool.shutdown();

    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(pool.cancel(queued_id), CancelOutcome::NotFound);
}

#[test]
fn cancelling_a_running_task_delivers_the_cooperative_signal() {
    let pool = quick_pool(1);
    let started = Arc::new(Barrier::new(2));
    let observed_cancel = Arc::new(AtomicBool::new(false));

    let started_clone = Arc::clone(&started);
    let observed_clone = Arc::clone(&observed_cancel);
    let id = pool
        .submit(move |token| {
            started_clone.wait();
            let interrupted = token.cancelled_sleep(Duration::from_secs(5));
            observed_clone.store(interrupted, Ordering::SeqCst);
        })
        .expect("task should be accepted");

    started.wait();
    let outcome = pool.cancel(id);
    assert_eq!(outcome, CancelOutcome::Terminated);

    std::thread::sleep(Duration::from_millis(100));
    pool.shutdown();

    assert!(observed_cancel.load(Ordering::SeqCst));
}

#[test]
fn elastic_workers_grow_to_cover_a_burst_and_the_pool_still_drains() {
    let pool = quick_pool(1);
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let completed = Arc::clone(&completed);
        pool.submit(move |token| {
            // A short cancellable sleep stands in for real work; it lets
            // several tasks overlap in time without the test depending on
            // real CPU-bound work finishing within a fixed window.
            token.cancelled_sleep(Duration::from_millis(30));
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("burst submission should be accepted");
    }

    std::thread::sleep(Duration::from_millis(300));
    pool.shutdown();

    assert_eq!(completed.load(Ordering::SeqCst), 8);
}

#[test]
fn shutdown_drops_the_backlog_without_running_it() {
    let pool = quick_pool(1);
    let holder_started = Arc::new(Barrier::new(2));

    {
        let holder_started = Arc::clone(&holder_started);
        pool.submit(move |token| {
            holder_started.wait();
            token.cancelled_sleep(Duration::from_secs(5));
        })
        .expect("holder task should be accepted");
    }
    holder_started.wait();

    let backlog_ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..5 {
        let backlog_ran = Arc::clone(&backlog_ran);
        pool.submit(move |_token| {
            backlog_ran.fetch_add(1, Ordering::SeqCst);
        })
        .expect("backlog submission should be accepted while not yet shutting down");
    }

    pool.shutdown();

    assert_eq!(backlog_ran.load(Ordering::SeqCst), 0);
}

#[test]
fn cancel_racing_completion_never_reports_more_than_one_terminal_outcome() {
    // Submits a fast task and immediately races a cancel against it,
    // repeated to cover both the "cancel lost the race" (NOT_FOUND) and
    // "cancel delivered to a still-running task" (TERMINATED) interleavings.
    // Whichever happens, a second cancel on the same id must be NOT_FOUND.
    let pool = quick_pool(2);

    for _ in 0..50 {
        let id = pool
            .submit(|token| {
                token.cancelled_sleep(Duration::from_millis(2));
            })
            .expect("submission should be accepted");

        let first = pool.cancel(id);
        assert!(matches!(
            first,
            CancelOutcome::Terminated | CancelOutcome::RemovedFromQueue | CancelOutcome::NotFound
        ));

        std::thread::sleep(Duration::from_millis(10));
        let second = pool.cancel(id);
        assert_eq!(second, CancelOutcome::NotFound);
    }

    pool.shutdown();
}
