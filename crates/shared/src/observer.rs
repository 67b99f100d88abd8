//! Structured observer boundary for advisory trace events.
//!
//! The scheduler core emits events (submit, assign, complete, cancel) through
//! this port. Observers are advisory only: nothing in the scheduler's
//! correctness depends on an observer being attached, slow, or even present.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// Severity of a trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Fine-grained scheduler transitions (assign, unassign).
    Debug,
    /// Lifecycle events (submit, complete, worker spawned/retired).
    Info,
    /// Recoverable anomalies (stray interrupt, late cancel).
    Warn,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => formatter.write_str("DEBUG"),
            Self::Info => formatter.write_str("INFO"),
            Self::Warn => formatter.write_str("WARN"),
        }
    }
}

/// Additional event fields, e.g. `task_id` or `worker_id`.
pub type LogFields = BTreeMap<&'static str, String>;

/// A single structured trace event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable event name, e.g. `"task.submitted"`.
    pub event: &'static str,
    /// Severity.
    pub level: LogLevel,
    /// Structured fields describing the event.
    pub fields: LogFields,
}

/// Boundary contract for structured observation of scheduler activity.
///
/// Implementors must be cheap to call from inside the scheduler's lock-free
/// execution region; the scheduler never awaits or blocks on an observer.
pub trait Observer: Send + Sync {
    /// Record a structured event.
    fn record(&self, event: LogEvent);
}

/// An observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn record(&self, _event: LogEvent) {}
}

/// An observer that writes one line per event to an in-process sink.
///
/// Used by the demo CLI; the sink is behind a mutex because multiple worker
/// threads may emit events concurrently and lines must not interleave.
pub struct LineObserver<W> {
    min_level: LogLevel,
    sink: Mutex<W>,
}

impl<W> LineObserver<W>
where
    W: std::io::Write + Send,
{
    /// Create a line observer writing to `sink`, filtering below `min_level`.
    pub fn new(sink: W, min_level: LogLevel) -> Self {
        Self {
            min_level,
            sink: Mutex::new(sink),
        }
    }

    fn should_log(&self, level: LogLevel) -> bool {
        rank(level) >= rank(self.min_level)
    }
}

const fn rank(level: LogLevel) -> u8 {
    match level {
        LogLevel::Debug => 0,
        LogLevel::Info => 1,
        LogLevel::Warn => 2,
    }
}

impl<W> Observer for LineObserver<W>
where
    W: std::io::Write + Send,
{
    fn record(&self, event: LogEvent) {
        if !self.should_log(event.level) {
            return;
        }

        let mut line = format!("[{}] {}", event.level, event.event);
        for (key, value) in &event.fields {
            use std::fmt::Write as _;
            let _ = write!(line, " {key}={value}");
        }

        #[allow(clippy::unwrap_used, reason = "poisoned sink mutex is unrecoverable here")]
        let mut sink = self.sink.lock().unwrap();
        let _ = writeln!(sink, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_observer_discards_everything() {
        let observer = NullObserver;
        observer.record(LogEvent {
            event: "task.submitted",
            level: LogLevel::Info,
            fields: LogFields::new(),
        });
    }

    #[test]
    fn line_observer_filters_below_min_level() {
        let buffer: Vec<u8> = Vec::new();
        let observer = LineObserver::new(buffer, LogLevel::Warn);
        observer.record(LogEvent {
            event: "task.submitted",
            level: LogLevel::Info,
            fields: LogFields::new(),
        });

        let sink = observer.sink.lock().expect("not poisoned");
        assert!(sink.is_empty(), "info event should be filtered at warn level");
    }

    #[test]
    fn line_observer_writes_matching_events() {
        let buffer: Vec<u8> = Vec::new();
        let observer = LineObserver::new(buffer, LogLevel::Debug);
        let mut fields = LogFields::new();
        fields.insert("task_id", "3".to_owned());
        observer.record(LogEvent {
            event: "task.submitted",
            level: LogLevel::Info,
            fields,
        });

        let sink = observer.sink.lock().expect("not poisoned");
        let text = String::from_utf8_lossy(&sink);
        assert!(text.contains("task.submitted"));
        assert!(text.contains("task_id=3"));
    }
}
