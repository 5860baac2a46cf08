//! Registry scan and queue activation.
//!
//! # Design
//! - Candidates are handled one at a time in query order; a failure never stops the scan.
//! - A name counts as attempted once a candidate with it passes validation; later
//!   definitions with that name are skipped as duplicates.
//! - Each activation is its own unit of work: refresh, copy, stamp, save. On failure the
//!   transient changes are discarded and the identifier is forgotten.

use std::collections::BTreeSet;

use tracing::{error, info, warn};
use updater_runner_config::SelectedUpdaters;
use updater_runner_repository::{PropertyValue, QueryLanguage, RepositoryError, RepositorySession};
use uuid::Uuid;

use crate::candidate::{RejectionReason, UpdaterCandidate, Validation, describe};
use crate::paths::{PROP_DRY_RUN, PROP_STARTED_BY, REGISTRY_QUERY, queue_entry};

/// A candidate that was copied to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRecord {
    /// Updater name.
    pub updater: String,
    /// Queue node name assigned to this activation.
    pub identifier: String,
}

/// Why a discovered candidate was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The name is not in the configured selection.
    NotSelected,
    /// A candidate with the same name already reached the queue copy in this scan.
    Duplicate,
}

impl SkipReason {
    /// Machine-readable reason code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotSelected => "not_selected",
            Self::Duplicate => "duplicate",
        }
    }
}

/// A candidate that was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Updater name.
    pub updater: String,
    /// Skip reason.
    pub reason: SkipReason,
}

/// A candidate that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Updater name.
    pub updater: String,
    /// Validation failure.
    pub reason: RejectionReason,
}

/// A validated candidate whose copy or commit failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationFailure {
    /// Updater name.
    pub updater: String,
    /// Failure detail reported by the repository.
    pub detail: String,
}

/// Outcome of one registry scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Activations committed to the queue, in scan order.
    pub activated: Vec<ActivationRecord>,
    /// Candidates that were not attempted.
    pub skipped: Vec<Skipped>,
    /// Candidates that failed validation.
    pub rejected: Vec<Rejection>,
    /// Candidates whose copy or commit failed.
    pub failed: Vec<ActivationFailure>,
}

impl ActivationReport {
    /// Identifiers of every committed activation; the in-flight set to monitor.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        self.activated
            .iter()
            .map(|record| record.identifier.clone())
            .collect()
    }
}

/// Activates selected registry updaters through a repository session.
#[derive(Debug)]
pub struct ActivationEngine<'a, S: ?Sized> {
    session: &'a S,
}

impl<'a, S> ActivationEngine<'a, S>
where
    S: RepositorySession + ?Sized,
{
    /// Engine working through `session`.
    #[must_use]
    pub const fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Scan the registry and copy every valid selected updater into the queue.
    ///
    /// A failing registry query is logged and produces an empty report.
    pub async fn activate(&self, selected: &SelectedUpdaters) -> ActivationReport {
        let mut report = ActivationReport::default();
        let nodes = match self
            .session
            .query(REGISTRY_QUERY, QueryLanguage::Xpath)
            .await
        {
            Ok(nodes) => nodes,
            Err(err) => {
                error!(error = %describe(&err), "registry scan failed; nothing activated");
                return report;
            }
        };
        info!(
            candidates = nodes.len(),
            selected = %selected,
            "registry scanned"
        );

        let mut attempted = BTreeSet::new();
        for node in nodes {
            let candidate = UpdaterCandidate::new(node);
            let name = candidate.name().to_string();
            if !selected.contains(&name) {
                info!(updater = %name, reason = SkipReason::NotSelected.code(), "updater skipped");
                report.skipped.push(Skipped {
                    updater: name,
                    reason: SkipReason::NotSelected,
                });
                continue;
            }
            if attempted.contains(&name) {
                warn!(
                    updater = %name,
                    path = %candidate.path(),
                    reason = SkipReason::Duplicate.code(),
                    "updater skipped"
                );
                report.skipped.push(Skipped {
                    updater: name,
                    reason: SkipReason::Duplicate,
                });
                continue;
            }

            match candidate.validate(self.session).await {
                Validation::Rejected(reason) => report.rejected.push(Rejection {
                    updater: name,
                    reason,
                }),
                Validation::Activatable(plan) => {
                    attempted.insert(name.clone());
                    info!(
                        updater = %name,
                        method = plan.method.kind(),
                        batch_size = plan.batch_size,
                        throttle_ms = plan.throttle_ms,
                        "updater validated"
                    );
                    match self.enqueue(&candidate).await {
                        Ok(identifier) => {
                            info!(updater = %name, identifier = %identifier, "updater activated");
                            report.activated.push(ActivationRecord {
                                updater: name,
                                identifier,
                            });
                        }
                        Err(err) => {
                            let detail = describe(&err);
                            error!(updater = %name, error = %detail, "updater activation failed");
                            self.discard_changes(&name).await;
                            report.failed.push(ActivationFailure {
                                updater: name,
                                detail,
                            });
                        }
                    }
                }
            }
        }

        info!(
            activated = report.activated.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            "activation finished"
        );
        report
    }

    async fn enqueue(&self, candidate: &UpdaterCandidate) -> Result<String, RepositoryError> {
        self.session.refresh(false).await?;
        let identifier = format!("{}{}", candidate.name(), Uuid::new_v4());
        let dest = queue_entry(&identifier);
        self.session.copy(candidate.path(), &dest).await?;
        self.session
            .set_property(&dest, PROP_DRY_RUN, PropertyValue::Boolean(false))
            .await?;
        self.session
            .set_property(
                &dest,
                PROP_STARTED_BY,
                PropertyValue::from(self.session.user_id()),
            )
            .await?;
        self.session.save().await?;
        Ok(identifier)
    }

    async fn discard_changes(&self, updater: &str) {
        if let Err(err) = self.session.refresh(false).await {
            warn!(updater, error = %describe(&err), "discarding transient changes failed");
        }
    }
}
