//! Loading and merging of properties files from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::defaults::DEFAULT_CONFIG_FILE;
use crate::error::{ConfigError, ConfigResult};
use crate::model::RunConfiguration;
use crate::properties::Properties;

/// Read and merge the given files in order; later files override earlier keys.
///
/// With no paths the default `runner.properties` in the working directory is read.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when a file cannot be read and [`ConfigError::Syntax`] when
/// a file is malformed.
pub fn load_files(paths: &[PathBuf]) -> ConfigResult<Properties> {
    let default_path = [PathBuf::from(DEFAULT_CONFIG_FILE)];
    let paths = if paths.is_empty() {
        &default_path[..]
    } else {
        paths
    };

    let mut merged = Properties::new();
    for path in paths {
        merged.merge(read_file(path)?);
    }
    info!(keys = ?merged.keys().collect::<Vec<_>>(), "loaded configuration properties");
    Ok(merged)
}

/// Load, merge and validate the run configuration.
///
/// # Errors
///
/// Propagates any loading or validation failure.
pub fn load_run_configuration(paths: &[PathBuf]) -> ConfigResult<RunConfiguration> {
    let properties = load_files(paths)?;
    RunConfiguration::from_properties(&properties)
}

fn read_file(path: &Path) -> ConfigResult<Properties> {
    info!(path = %path.display(), "reading configuration file");
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    Properties::parse(&contents, Some(path))
}
