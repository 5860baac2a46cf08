//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key was absent or blank.
    #[error("missing configuration field")]
    MissingField {
        /// Property key that was missing.
        key: &'static str,
    },
    /// A key contained a value that failed validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Property key that failed validation.
        key: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A properties file could not be parsed.
    #[error("malformed properties file")]
    Syntax {
        /// File that contained the malformed entry.
        path: Option<PathBuf>,
        /// One-based line number of the malformed entry.
        line: usize,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    /// Key or path that the error refers to, for log fields.
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::MissingField { key } | Self::InvalidField { key, .. } => (*key).to_string(),
            Self::Syntax { path, line, .. } => path.as_ref().map_or_else(
                || format!("line {line}"),
                |path| format!("{}:{line}", path.display()),
            ),
            Self::Io { path, .. } => path.display().to_string(),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
