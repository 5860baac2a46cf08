//! Capped exponential backoff and the cancellable completion wait.

use std::future::Future;
use std::time::Duration;

use tracing::info;
use updater_runner_repository::RepositorySession;

use crate::error::MonitorResult;
use crate::monitor::CompletionMonitor;

/// First wait between completion checks.
pub const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Endless sequence of waits: doubling from [`INITIAL_POLL_INTERVAL`], capped at `max`.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    next: Duration,
    max: Duration,
}

impl PollSchedule {
    /// Schedule capped at `max`.
    #[must_use]
    pub fn new(max: Duration) -> Self {
        Self {
            next: INITIAL_POLL_INTERVAL.min(max),
            max,
        }
    }

    /// Upper bound of every wait.
    #[must_use]
    pub const fn ceiling(&self) -> Duration {
        self.max
    }

    /// Current wait; advances the schedule.
    pub fn next_interval(&mut self) -> Duration {
        let current = self.next;
        self.next = current.saturating_mul(2).min(self.max);
        current
    }
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_interval())
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every identifier reached the history.
    Finished,
    /// The cancellation future resolved during a wait.
    Cancelled,
}

/// Poll `monitor` until every identifier in `pending` has finished or `cancel` resolves.
///
/// Checks first, then sleeps for the next interval of `schedule`. After each check only the
/// still-unfinished identifiers are carried into the next round.
///
/// # Errors
///
/// Returns the first [`crate::MonitorError`] raised by a completion check.
pub async fn wait_until_done<S, C>(
    monitor: &CompletionMonitor<'_, S>,
    pending: Vec<String>,
    mut schedule: PollSchedule,
    cancel: C,
) -> MonitorResult<WaitOutcome>
where
    S: RepositorySession + ?Sized,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let mut pending = pending;
    loop {
        let status = monitor.check(&pending).await?;
        if status.is_done() {
            return Ok(WaitOutcome::Finished);
        }
        pending = status.unfinished;

        let interval = schedule.next_interval();
        info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            unfinished = pending.len(),
            "waiting for updaters"
        );
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = &mut cancel => {
                info!(unfinished = pending.len(), "wait cancelled");
                return Ok(WaitOutcome::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use crate::paths::HISTORY_PATH;
    use tokio::time::Instant;
    use updater_runner_repository::{Credentials, MemoryRepository, Repository};
    use updater_runner_test_support::fixtures::{mark_finished, seed_registry};

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_secs).collect()
    }

    #[test]
    fn schedule_doubles_and_saturates() {
        let waits: Vec<Duration> = PollSchedule::new(Duration::from_secs(8)).take(5).collect();
        assert_eq!(waits, secs(&[2, 4, 8, 8, 8]));

        let waits: Vec<Duration> = PollSchedule::new(Duration::from_secs(3)).take(3).collect();
        assert_eq!(waits, secs(&[2, 3, 3]));

        let waits: Vec<Duration> = PollSchedule::new(Duration::from_secs(1)).take(2).collect();
        assert_eq!(waits, secs(&[1, 1]));
    }

    #[test]
    fn next_interval_advances_without_exceeding_ceiling() {
        let mut schedule = PollSchedule::new(Duration::from_secs(5));
        assert_eq!(schedule.ceiling(), Duration::from_secs(5));
        let waits: Vec<Duration> = (0..4).map(|_| schedule.next_interval()).collect();
        assert_eq!(waits, secs(&[2, 4, 5, 5]));
        assert!(waits.iter().all(|wait| *wait <= schedule.ceiling()));
    }

    #[test]
    fn schedule_is_non_decreasing() {
        let waits: Vec<Duration> = PollSchedule::new(Duration::from_secs(300)).take(12).collect();
        assert!(waits.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(waits.last(), Some(&Duration::from_secs(300)));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_history_appears() -> anyhow::Result<()> {
        let repository = MemoryRepository::new();
        seed_registry(&repository, []).await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        let background = repository.clone();
        let finisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            mark_finished(&background, "a-1").await
        });

        let started = Instant::now();
        let outcome = wait_until_done(
            &CompletionMonitor::new(&session),
            vec!["a-1".to_string()],
            PollSchedule::new(Duration::from_secs(300)),
            std::future::pending(),
        )
        .await?;

        assert_eq!(outcome, WaitOutcome::Finished);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
        finisher.await??;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_sleep_returns_cancelled() -> anyhow::Result<()> {
        let repository = MemoryRepository::new();
        seed_registry(&repository, []).await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;

        let outcome = wait_until_done(
            &CompletionMonitor::new(&session),
            vec!["a-1".to_string()],
            PollSchedule::new(Duration::from_secs(300)),
            tokio::time::sleep(Duration::from_secs(3)),
        )
        .await?;

        assert_eq!(outcome, WaitOutcome::Cancelled);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failing_check_ends_the_wait() -> anyhow::Result<()> {
        let repository = MemoryRepository::new();
        seed_registry(&repository, []).await?;
        repository.fail_reads_under(HISTORY_PATH, 4).await;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;

        let result = wait_until_done(
            &CompletionMonitor::new(&session),
            vec!["a-1".to_string()],
            PollSchedule::new(Duration::from_secs(8)),
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(MonitorError::Repository { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn nothing_pending_finishes_immediately() -> anyhow::Result<()> {
        let repository = MemoryRepository::new();
        seed_registry(&repository, []).await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;

        let outcome = wait_until_done(
            &CompletionMonitor::new(&session),
            Vec::new(),
            PollSchedule::new(Duration::from_secs(1)),
            std::future::pending(),
        )
        .await?;
        assert_eq!(outcome, WaitOutcome::Finished);
        Ok(())
    }
}
