//! Typed run configuration.
//!
//! # Design
//! - Pure data carriers; construction goes through `validate.rs` so a value of these types is
//!   always valid.
//! - Credentials never print their password.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use crate::defaults::SCRIPT_SEPARATOR;

/// Connection parameters for the content repository.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryCredentials {
    /// Repository endpoint.
    pub url: String,
    /// Login name.
    pub user: String,
    /// Login password.
    pub pass: String,
}

impl Debug for RepositoryCredentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RepositoryCredentials")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Ordered, de-duplicated set of updater names selected for activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedUpdaters {
    names: Vec<String>,
}

impl SelectedUpdaters {
    /// Split a comma-separated list, trimming entries and dropping blanks and repeats.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split(SCRIPT_SEPARATOR).collect()
    }

    /// Whether `name` was selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|selected| selected == name)
    }

    /// Selected names in configuration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of selected names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SelectedUpdaters {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for entry in iter {
            let name = entry.as_ref().trim();
            if !name.is_empty() && !names.iter().any(|known| known == name) {
                names.push(name.to_string());
            }
        }
        Self { names }
    }
}

impl fmt::Display for SelectedUpdaters {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.names.join(", "))
    }
}

/// Validated configuration for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Repository connection parameters.
    pub repository: RepositoryCredentials,
    /// Updaters to activate.
    pub selected_updaters: SelectedUpdaters,
    /// Whether to wait until every activated updater has finished.
    pub wait_until_done: bool,
    /// Ceiling for the polling interval, in seconds.
    pub max_sleep_interval_secs: u64,
}

impl RunConfiguration {
    /// Ceiling for the polling interval.
    #[must_use]
    pub const fn max_sleep_interval(&self) -> Duration {
        Duration::from_secs(self.max_sleep_interval_secs)
    }
}
