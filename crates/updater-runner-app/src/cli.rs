//! Command-line arguments for the `updater-runner` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default per-request timeout for the repository transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Activate registry updaters in a content repository and optionally wait for them.
#[derive(Debug, Clone, Parser)]
#[command(name = "updater-runner", version)]
pub struct Cli {
    /// Property files to load in order; later files override earlier keys.
    /// Defaults to `runner.properties` in the working directory.
    #[arg(value_name = "CONFIG")]
    pub config_files: Vec<PathBuf>,
    /// Per-request timeout for repository calls, in seconds.
    #[arg(
        long,
        env = "UPDATER_RUNNER_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout: u64,
}

impl Cli {
    /// Repository request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_files_are_positional_and_ordered() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["updater-runner", "base.properties", "local.properties"])?;
        assert_eq!(
            cli.config_files,
            [
                PathBuf::from("base.properties"),
                PathBuf::from("local.properties")
            ]
        );
        Ok(())
    }

    #[test]
    fn no_arguments_means_default_file_and_timeout() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["updater-runner", "--timeout", "5"])?;
        assert!(cli.config_files.is_empty());
        assert_eq!(cli.request_timeout(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["updater-runner", "--bogus"]).is_err());
    }
}
