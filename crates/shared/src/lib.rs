//! # taskpool-shared
//!
//! Shared error types and the observer boundary used across the taskpool
//! workspace.
//!
//! - [`errors`] — structured error-envelope types
//! - [`observer`] — the advisory trace-event boundary the scheduler reports
//!   through (submit, assign, complete, cancel)
//! - [`validation`] — a small `Validate` trait used by `PoolConfig`
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Advisory, not contractual** - nothing here participates in the
//!    scheduler's correctness; it may be swapped or omitted entirely

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod observer;
pub mod result;
pub mod validation;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use observer::{LineObserver, LogEvent, LogFields, LogLevel, NullObserver, Observer};
pub use result::{Result, ResultExt};
pub use validation::{Validate, ValidationError};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
