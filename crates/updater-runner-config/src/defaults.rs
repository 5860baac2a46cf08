//! Recognised property keys and their defaults.
//!
//! # Design
//! - Keys match the files operators already keep next to the runner.
//! - Defaults live here so validation and documentation cannot drift apart.

/// Properties file read when no paths are given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "runner.properties";
/// Repository endpoint key.
pub const KEY_REPOSITORY_URL: &str = "repository.url";
/// Repository user key.
pub const KEY_REPOSITORY_USER: &str = "repository.user";
/// Repository password key.
pub const KEY_REPOSITORY_PASS: &str = "repository.pass";
/// Comma-separated list of updater names to activate.
pub const KEY_GROOVY_SCRIPTS: &str = "groovy.scripts";
/// Whether the run waits for every activated updater to reach the history.
pub const KEY_WAIT_UNTIL_DONE: &str = "wait.until.done";
/// Upper bound, in seconds, for the polling interval.
pub const KEY_MAX_SLEEP_INTERVAL: &str = "max.sleep.interval";
/// Separator used by `groovy.scripts`.
pub const SCRIPT_SEPARATOR: char = ',';
/// Default polling ceiling in seconds.
pub const DEFAULT_MAX_SLEEP_INTERVAL_SECS: u64 = 300;
