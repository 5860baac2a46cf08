//! Completion checks against the updater history.

use tracing::{debug, info};
use updater_runner_repository::RepositorySession;

use crate::error::{MonitorError, MonitorResult};
use crate::paths::{HISTORY_PATH, history_entry};

/// Split of pending identifiers into finished and still-running ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionStatus {
    /// Identifiers present in the history.
    pub finished: Vec<String>,
    /// Identifiers not yet in the history.
    pub unfinished: Vec<String>,
}

impl CompletionStatus {
    /// Whether every identifier has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.unfinished.is_empty()
    }
}

/// Reads the history folder to decide which activations have finished.
#[derive(Debug)]
pub struct CompletionMonitor<'a, S: ?Sized> {
    session: &'a S,
}

impl<'a, S> CompletionMonitor<'a, S>
where
    S: RepositorySession + ?Sized,
{
    /// Monitor reading through `session`.
    #[must_use]
    pub const fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Check each pending identifier against the history folder.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::HistoryMissing`] when the history folder does not exist and
    /// [`MonitorError::Repository`] for any read failure.
    pub async fn check(&self, pending: &[String]) -> MonitorResult<CompletionStatus> {
        if let Err(source) = self.session.get_node(HISTORY_PATH).await {
            if source.is_not_found() {
                return Err(MonitorError::HistoryMissing { path: HISTORY_PATH });
            }
            return Err(MonitorError::Repository {
                operation: "monitor.history_root",
                path: HISTORY_PATH.to_string(),
                source,
            });
        }

        let mut status = CompletionStatus::default();
        for identifier in pending {
            let entry = history_entry(identifier);
            let finished = self
                .session
                .node_exists(&entry)
                .await
                .map_err(|source| MonitorError::Repository {
                    operation: "monitor.history_entry",
                    path: entry.clone(),
                    source,
                })?;
            debug!(identifier = %identifier, finished, "history checked");
            if finished {
                status.finished.push(identifier.clone());
            } else {
                status.unfinished.push(identifier.clone());
            }
        }

        if status.is_done() {
            info!(finished = status.finished.len(), "all updaters finished");
        } else {
            info!(unfinished = ?status.unfinished, "updaters still running");
        }
        Ok(status)
    }

    /// Whether every pending identifier has reached the history.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`CompletionMonitor::check`].
    pub async fn is_done(&self, pending: &[String]) -> MonitorResult<bool> {
        Ok(self.check(pending).await?.is_done())
    }
}
