//! # Design
//!
//! - Centralize application-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Map every failure class to a process exit code in one place.

use thiserror::Error;
use updater_runner_config::ConfigError;
use updater_runner_core::MonitorError;
use updater_runner_repository::RepositoryError;
use updater_runner_telemetry::TelemetryError;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Exit code for a successful, non-waiting or cancelled run.
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration and logging installation problems.
pub const EXIT_CONFIG: i32 = 1;
/// Exit code for a repository failure while checking completion.
pub const EXIT_MONITOR: i32 = 2;
/// Exit code for a connection or login failure at startup.
pub const EXIT_CONNECT: i32 = 3;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or validated.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ConfigError,
    },
    /// Logging could not be installed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: TelemetryError,
    },
    /// The repository could not be reached or refused the login.
    #[error("repository connection failed")]
    Connect {
        /// Operation identifier.
        operation: &'static str,
        /// Repository location.
        location: String,
        /// Source repository error.
        source: RepositoryError,
    },
    /// Completion monitoring failed.
    #[error("completion monitoring failed")]
    Monitor {
        /// Operation identifier.
        operation: &'static str,
        /// Source monitor error.
        source: MonitorError,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) fn connect(
        operation: &'static str,
        location: &str,
        source: RepositoryError,
    ) -> Self {
        Self::Connect {
            operation,
            location: location.to_string(),
            source,
        }
    }

    pub(crate) const fn monitor(operation: &'static str, source: MonitorError) -> Self {
        Self::Monitor { operation, source }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Telemetry { .. } => EXIT_CONFIG,
            Self::Monitor { .. } => EXIT_MONITOR,
            Self::Connect { .. } => EXIT_CONNECT,
        }
    }

    /// Operation label carried by the error.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Config { operation, .. }
            | Self::Telemetry { operation, .. }
            | Self::Connect { operation, .. }
            | Self::Monitor { operation, .. } => operation,
        }
    }
}
