//! # Design
//!
//! - Provide structured, constant-message errors for repository access.
//! - Capture operation context (paths, URLs, statements) in fields rather than messages.
//! - Preserve transport errors as sources.

use thiserror::Error;

/// Result alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised by repository sessions.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The repository refused the supplied credentials.
    #[error("repository login rejected")]
    LoginRejected {
        /// User that attempted to log in.
        user: String,
    },
    /// The session was already logged out.
    #[error("repository session is closed")]
    SessionClosed,
    /// No item exists at the requested path.
    #[error("repository item not found")]
    NotFound {
        /// Requested path.
        path: String,
    },
    /// An item already exists at the destination path.
    #[error("repository item already exists")]
    ItemExists {
        /// Conflicting path.
        path: String,
    },
    /// The path is not a well-formed absolute repository path.
    #[error("malformed repository path")]
    MalformedPath {
        /// Offending path.
        path: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A query statement could not be parsed.
    #[error("invalid repository query")]
    InvalidQuery {
        /// Offending statement.
        statement: String,
        /// Parser or server detail.
        reason: String,
    },
    /// Pending changes could not be committed.
    #[error("repository commit failed")]
    Commit {
        /// Detail reported by the repository.
        reason: String,
    },
    /// The repository is temporarily unable to serve the operation.
    #[error("repository operation unavailable")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved, when known.
        path: Option<String>,
    },
    /// The operation is not supported by this repository implementation.
    #[error("unsupported repository operation")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
        /// Value that triggered the failure.
        value: Option<String>,
    },
    /// The repository location could not be parsed as a URL.
    #[error("invalid repository location")]
    InvalidLocation {
        /// Location as configured.
        value: String,
        /// Source parse error.
        source: url::ParseError,
    },
    /// Building the HTTP client failed.
    #[error("http client construction failed")]
    ClientBuild {
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// An HTTP request failed before a response was received.
    #[error("repository request failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The repository answered with an unexpected status.
    #[error("repository response status error")]
    HttpStatus {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("repository response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
}

impl RepositoryError {
    pub(crate) fn not_found(path: &str) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn invalid_query(statement: &str, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            statement: statement.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error only says that the requested item does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
