//! Run lifecycle: login, activation, optional wait, logout.
//!
//! # Design
//! - The session is owned by [`execute`] and logged out on every exit path.
//! - Cancellation is an outcome, not an error; activations are never undone.

use std::future::Future;

use tracing::{info, warn};
use updater_runner_config::RunConfiguration;
use updater_runner_core::{
    ActivationEngine, ActivationReport, CompletionMonitor, PollSchedule, WaitOutcome,
    wait_until_done,
};
use updater_runner_repository::{Credentials, Repository, RepositorySession};
use updater_runner_telemetry::record_run_phase;

use crate::error::{AppError, AppResult};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Activation finished and waiting was not requested.
    Activated,
    /// Every activated updater reached the history.
    Finished,
    /// The wait was cancelled before every updater finished.
    Cancelled,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// What the activation scan did.
    pub report: ActivationReport,
}

/// Drives one run over an open session.
#[derive(Debug)]
pub struct Orchestrator<'a, S: ?Sized> {
    session: &'a S,
    config: &'a RunConfiguration,
}

impl<'a, S> Orchestrator<'a, S>
where
    S: RepositorySession + ?Sized,
{
    /// Orchestrator for `config` working through `session`.
    #[must_use]
    pub const fn new(session: &'a S, config: &'a RunConfiguration) -> Self {
        Self { session, config }
    }

    /// Activate the selected updaters and, when configured, wait for them to finish.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Monitor`] when a completion check fails.
    pub async fn run<C>(&self, cancel: C) -> AppResult<RunSummary>
    where
        C: Future<Output = ()>,
    {
        record_run_phase("activating");
        let report = ActivationEngine::new(self.session)
            .activate(&self.config.selected_updaters)
            .await;

        if !self.config.wait_until_done {
            info!(activated = report.activated.len(), "not waiting for updaters");
            return Ok(RunSummary {
                outcome: RunOutcome::Activated,
                report,
            });
        }

        record_run_phase("polling");
        let monitor = CompletionMonitor::new(self.session);
        let schedule = PollSchedule::new(self.config.max_sleep_interval());
        let waited = wait_until_done(&monitor, report.identifiers(), schedule, cancel)
            .await
            .map_err(|err| AppError::monitor("orchestrator.wait", err))?;
        let outcome = match waited {
            WaitOutcome::Finished => RunOutcome::Finished,
            WaitOutcome::Cancelled => RunOutcome::Cancelled,
        };
        Ok(RunSummary { outcome, report })
    }
}

/// Log in to `repository`, run, and log out regardless of the result.
///
/// # Errors
///
/// Returns [`AppError::Connect`] when login fails and propagates run failures.
pub async fn execute<R, C>(
    repository: &R,
    config: &RunConfiguration,
    cancel: C,
) -> AppResult<RunSummary>
where
    R: Repository,
    C: Future<Output = ()>,
{
    record_run_phase("connecting");
    let credentials = Credentials::new(
        config.repository.user.clone(),
        config.repository.pass.clone(),
    );
    let session = repository
        .login(&credentials)
        .await
        .map_err(|err| AppError::connect("repository.login", repository.location(), err))?;

    let result = Orchestrator::new(&session, config).run(cancel).await;

    record_run_phase("closing");
    session.logout().await;
    if let Err(err) = &result {
        warn!(operation = err.operation(), "run ended with an error");
    }
    result
}
