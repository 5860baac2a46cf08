//! # Design
//!
//! - Completion monitoring failures are fatal to a run and carry the path being read.
//! - Per-candidate problems are outcomes, not errors; see `candidate` and `activation`.

use thiserror::Error;
use updater_runner_repository::RepositoryError;

/// Result alias for completion monitoring.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised while checking updater completion.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The history folder does not exist.
    #[error("updater history folder is missing")]
    HistoryMissing {
        /// Expected history path.
        path: &'static str,
    },
    /// Reading the repository failed.
    #[error("completion check failed")]
    Repository {
        /// Operation identifier.
        operation: &'static str,
        /// Path being read.
        path: String,
        /// Source repository error.
        source: RepositoryError,
    },
}
