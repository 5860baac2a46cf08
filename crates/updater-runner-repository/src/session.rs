//! Repository and session traits implemented by the in-memory store and the HTTP transport.

use async_trait::async_trait;

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{Credentials, Node, PropertyValue, QueryLanguage};

/// A repository that hands out authenticated sessions.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Session type produced by [`Repository::login`].
    type Session: RepositorySession;

    /// Human-readable location used in logs.
    fn location(&self) -> &str;

    /// Open a session for the supplied credentials.
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<Self::Session>;
}

/// An authenticated unit of work against the repository.
///
/// Writes (`copy`, `set_property`) stay transient until [`RepositorySession::save`];
/// [`RepositorySession::refresh`] with `keep_changes = false` discards them.
#[async_trait]
pub trait RepositorySession: Send + Sync {
    /// Identifier of the logged-in user.
    fn user_id(&self) -> &str;

    /// Whether the session can still be used.
    async fn is_live(&self) -> bool;

    /// Run a query and return the matching nodes.
    async fn query(&self, statement: &str, language: QueryLanguage)
    -> RepositoryResult<Vec<Node>>;

    /// Check that a statement parses without running it.
    async fn validate_query(&self, statement: &str, language: QueryLanguage)
    -> RepositoryResult<()>;

    /// Fetch the node at `path`.
    async fn get_node(&self, path: &str) -> RepositoryResult<Node>;

    /// Whether a node exists at `path`.
    async fn node_exists(&self, path: &str) -> RepositoryResult<bool> {
        match self.get_node(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Record a subtree copy from `src` to `dest`.
    async fn copy(&self, src: &str, dest: &str) -> RepositoryResult<()>;

    /// Record a property write on the node at `path`.
    async fn set_property(
        &self,
        path: &str,
        name: &str,
        value: PropertyValue,
    ) -> RepositoryResult<()>;

    /// Persist every pending change atomically.
    async fn save(&self) -> RepositoryResult<()>;

    /// Reload persisted state, keeping or discarding pending changes.
    async fn refresh(&self, keep_changes: bool) -> RepositoryResult<()>;

    /// Close the session; further calls fail with [`RepositoryError::SessionClosed`].
    async fn logout(&self);
}

/// Reject work on a session that has been logged out.
pub(crate) const fn ensure_live(live: bool) -> RepositoryResult<()> {
    if live {
        Ok(())
    } else {
        Err(RepositoryError::SessionClosed)
    }
}
