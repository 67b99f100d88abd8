//! `tpctl`: an interactive driver for [`taskpool::Pool`].
//!
//! Reads commands from stdin, one per line:
//!
//! - `add <seconds>` — submit a task that sleeps for `seconds`, printing
//!   its assigned id.
//! - `cancel <id>` — request cancellation of a previously submitted task,
//!   printing the outcome.
//!
//! Any other line prints `Error`. End of input (Ctrl-D) shuts the pool
//! down gracefully, waiting for in-flight tasks to finish or observe
//! cancellation, then exits.
//!
//! `--build-info` prints compile-time build metadata and exits without
//! starting the pool or reading stdin.

mod sleep_task;

use clap::Parser;
use sleep_task::sleep_task;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use taskpool::{CancelOutcome, Pool, PoolConfig, TaskId};
use taskpool_build_info::{BuildInfo, build_info};
use taskpool_shared::{LineObserver, LogLevel, Validate};

/// Run an interactive task pool from the command line.
#[derive(Debug, Parser)]
#[command(name = "tpctl", version, about = "Interactive task pool driver", long_about = None)]
struct Cli {
    /// Number of hot worker threads kept alive for the process lifetime.
    num_hot_threads: usize,
    /// Idle timeout, in seconds, after which an elastic worker retires.
    timeout: u64,
    /// Emit one structured trace line per scheduler event on stderr.
    #[arg(long)]
    trace: bool,
    /// Print build metadata and exit without starting the pool.
    #[arg(long)]
    build_info: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.build_info {
        print_build_info(&build_info());
        return ExitCode::SUCCESS;
    }

    let config = PoolConfig {
        hot_workers: cli.num_hot_threads,
        elastic_idle_timeout: std::time::Duration::from_secs(cli.timeout),
    };

    if let Err(error) = config.validate() {
        eprintln!("invalid configuration: {error}");
        return ExitCode::from(2);
    }

    let pool = if cli.trace {
        Pool::with_config_and_observer(
            config,
            Box::new(LineObserver::new(io::stderr(), LogLevel::Debug)),
        )
    } else {
        Pool::with_config(config)
    };

    run_repl(&pool);
    pool.shutdown();
    ExitCode::SUCCESS
}

fn run_repl(pool: &Pool) {
    let stdin = io::stdin();
    let stdout = io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let response = handle_line(pool, &line);

        let mut out = stdout.lock();
        let _ = writeln!(out, "{response}");
    }
}

fn handle_line(pool: &Pool, line: &str) -> String {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        ["add", seconds] => match seconds.parse::<u64>() {
            Ok(seconds) => match pool.submit(sleep_task(seconds)) {
                Ok(id) => format!("Task id: {}", id.value()),
                Err(_) => "Error".to_owned(),
            },
            Err(_) => "Error".to_owned(),
        },
        ["cancel", id] => match id.parse::<u64>() {
            Ok(raw_id) => format_cancel(raw_id, pool.cancel(TaskId::from_raw(raw_id))),
            Err(_) => "Error".to_owned(),
        },
        _ => "Error".to_owned(),
    }
}

fn format_cancel(raw_id: u64, outcome: CancelOutcome) -> String {
    format!("Task {raw_id} {outcome}")
}

fn print_build_info(build: &BuildInfo) {
    println!(
        "name: {}\nversion: {}\nrustc: {}\ntarget: {}\nprofile: {}\ngit: {}{}",
        build.name,
        build.version,
        build.rustc_version,
        build.target,
        build.profile,
        build.git_hash.unwrap_or("none"),
        if build.git_dirty { " (dirty)" } else { "" }
    );
}
