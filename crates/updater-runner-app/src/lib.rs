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

//! Updater runner application wiring.
//!
//! Layout: `bootstrap.rs` (process entry and exit codes), `cli.rs` (arguments),
//! `orchestrator.rs` (run lifecycle), `error.rs`.

/// Process entry and exit-code mapping.
pub mod bootstrap;
/// Command-line arguments.
pub mod cli;
/// Application error type and exit codes.
pub mod error;
/// Run lifecycle over a repository session.
pub mod orchestrator;

pub use bootstrap::{run, run_app};
pub use cli::Cli;
pub use error::{AppError, AppResult, EXIT_CONFIG, EXIT_CONNECT, EXIT_MONITOR, EXIT_OK};
pub use orchestrator::{Orchestrator, RunOutcome, RunSummary, execute};
