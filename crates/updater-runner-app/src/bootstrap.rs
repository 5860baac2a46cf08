//! Process entry: argument parsing, logging, configuration and exit-code mapping.

use std::future::Future;

use clap::Parser;
use tracing::{error, info, warn};
use updater_runner_config::load_run_configuration;
use updater_runner_repository::RestRepository;
use updater_runner_telemetry::{GlobalContextGuard, LoggingConfig, init_logging};

use crate::cli::Cli;
use crate::error::{AppError, AppResult, EXIT_CONFIG, EXIT_OK};
use crate::orchestrator::{RunOutcome, RunSummary, execute};

/// Entry point for the binary; returns the process exit code.
pub async fn run_app() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { EXIT_CONFIG } else { EXIT_OK };
            if let Err(print_err) = err.print() {
                eprintln!("error: {print_err}");
            }
            return code;
        }
    };

    if let Err(err) = init_logging(&LoggingConfig::from_env()) {
        let err = AppError::telemetry("telemetry.init", err);
        eprintln!("error: {err}");
        return err.exit_code();
    }
    let _context = GlobalContextGuard::new("bootstrap");

    match run(&cli, shutdown_signal()).await {
        Ok(summary) => {
            info!(
                outcome = ?summary.outcome,
                activated = summary.report.activated.len(),
                "updater runner finished"
            );
            EXIT_OK
        }
        Err(err) => {
            error!(operation = err.operation(), error = ?err, "updater runner failed");
            err.exit_code()
        }
    }
}

/// Load configuration for `cli`, connect over HTTP and execute one run.
///
/// # Errors
///
/// Returns [`AppError::Config`] for configuration problems, [`AppError::Connect`] when the
/// repository cannot be reached, and [`AppError::Monitor`] when completion checks fail.
pub async fn run<C>(cli: &Cli, cancel: C) -> AppResult<RunSummary>
where
    C: Future<Output = ()>,
{
    let config = load_run_configuration(&cli.config_files)
        .map_err(|err| AppError::config("config.load", err))?;
    info!(
        url = %config.repository.url,
        user = %config.repository.user,
        updaters = %config.selected_updaters,
        wait_until_done = config.wait_until_done,
        max_sleep_interval_secs = config.max_sleep_interval_secs,
        "configuration loaded"
    );

    let repository = RestRepository::new(&config.repository.url, cli.request_timeout())
        .map_err(|err| AppError::connect("repository.connect", &config.repository.url, err))?;
    let summary = execute(&repository, &config, cancel).await?;
    if summary.outcome == RunOutcome::Cancelled {
        warn!("run cancelled before every updater finished");
    }
    Ok(summary)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "interrupt handler unavailable; waiting without cancellation");
        std::future::pending::<()>().await;
    }
    info!("interrupt received");
}
