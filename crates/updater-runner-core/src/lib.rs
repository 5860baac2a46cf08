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

//! Updater activation and completion tracking.
//!
//! Layout: `candidate.rs` (registry definitions and their validation), `activation.rs`
//! (registry scan and queue copies), `monitor.rs` (history checks), `wait.rs` (backoff and
//! the cancellable wait), `paths.rs` (fixed repository layout), `error.rs`.

pub mod activation;
pub mod candidate;
pub mod error;
pub mod monitor;
pub mod paths;
pub mod wait;

pub use activation::{
    ActivationEngine, ActivationFailure, ActivationRecord, ActivationReport, Rejection,
    SkipReason, Skipped,
};
pub use candidate::{
    ActivationMethod, ActivationPlan, RejectionReason, UpdaterCandidate, Validation,
};
pub use error::{MonitorError, MonitorResult};
pub use monitor::{CompletionMonitor, CompletionStatus};
pub use wait::{INITIAL_POLL_INTERVAL, PollSchedule, WaitOutcome, wait_until_done};
