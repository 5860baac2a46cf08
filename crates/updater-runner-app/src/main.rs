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

//! Binary entrypoint for the updater runner.
//!
//! Exit status:
//!
//! - `0`: activation done without waiting, every updater finished, or the wait was cancelled.
//! - `1`: configuration could not be loaded or validated, or logging could not be installed.
//! - `2`: the repository failed while checking completion.
//! - `3`: the repository could not be reached or rejected the login.

use updater_runner_app::run_app;

/// Runs one activation pass and exits with the mapped status code.
#[tokio::main]
async fn main() {
    let code = run_app().await;
    std::process::exit(code);
}
