#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging primitives shared across the updater runner workspace.
//!
//! Layout: `init.rs` (subscriber installation and format selection), `context.rs`
//! (run-level span guard), `error.rs` (telemetry error type).

pub mod context;
pub mod error;
pub mod init;

pub use context::{GlobalContextGuard, record_run_phase};
pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LOG_FORMAT_ENV, LogFormat, LoggingConfig, build_sha, init_logging,
};
