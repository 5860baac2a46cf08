//! Validation helpers that turn raw properties into a [`RunConfiguration`].

use tracing::{error, info};

use crate::defaults::{
    DEFAULT_MAX_SLEEP_INTERVAL_SECS, KEY_GROOVY_SCRIPTS, KEY_MAX_SLEEP_INTERVAL,
    KEY_REPOSITORY_PASS, KEY_REPOSITORY_URL, KEY_REPOSITORY_USER, KEY_WAIT_UNTIL_DONE,
    SCRIPT_SEPARATOR,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{RepositoryCredentials, RunConfiguration, SelectedUpdaters};
use crate::properties::Properties;

impl RunConfiguration {
    /// Validate raw properties and build an immutable run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for absent required keys and
    /// [`ConfigError::InvalidField`] for values that fail validation.
    pub fn from_properties(properties: &Properties) -> ConfigResult<Self> {
        info!(keys = properties.len(), "validating run configuration");
        let result = build(properties);
        if let Err(err) = &result {
            error!(error = %err, field = %err.subject(), "run configuration rejected");
        }
        result
    }
}

fn build(properties: &Properties) -> ConfigResult<RunConfiguration> {
    let repository = RepositoryCredentials {
        url: required(properties, KEY_REPOSITORY_URL)?,
        user: required(properties, KEY_REPOSITORY_USER)?,
        pass: required(properties, KEY_REPOSITORY_PASS)?,
    };
    let selected_updaters = parse_selected_updaters(properties.get(KEY_GROOVY_SCRIPTS))?;
    let wait_until_done = parse_flag(properties.get(KEY_WAIT_UNTIL_DONE));
    let max_sleep_interval_secs = parse_max_sleep_interval(properties.get(KEY_MAX_SLEEP_INTERVAL))?;

    Ok(RunConfiguration {
        repository,
        selected_updaters,
        wait_until_done,
        max_sleep_interval_secs,
    })
}

fn required(properties: &Properties, key: &'static str) -> ConfigResult<String> {
    match properties.get(key) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ConfigError::MissingField { key }),
    }
}

pub(crate) fn parse_selected_updaters(raw: Option<&str>) -> ConfigResult<SelectedUpdaters> {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => {
            return Err(ConfigError::MissingField {
                key: KEY_GROOVY_SCRIPTS,
            });
        }
    };

    if !raw.contains(SCRIPT_SEPARATOR) {
        return Err(ConfigError::InvalidField {
            key: KEY_GROOVY_SCRIPTS,
            value: Some(raw.to_string()),
            reason: "missing_separator",
        });
    }

    let selected = SelectedUpdaters::parse(raw);
    if selected.is_empty() {
        return Err(ConfigError::InvalidField {
            key: KEY_GROOVY_SCRIPTS,
            value: Some(raw.to_string()),
            reason: "no_updater_names",
        });
    }
    Ok(selected)
}

pub(crate) fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

pub(crate) fn parse_max_sleep_interval(raw: Option<&str>) -> ConfigResult<u64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_SLEEP_INTERVAL_SECS);
    };

    let invalid = |reason| ConfigError::InvalidField {
        key: KEY_MAX_SLEEP_INTERVAL,
        value: Some(raw.to_string()),
        reason,
    };
    let seconds = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid("not_an_integer"))?;
    if seconds <= 0 {
        return Err(invalid("must_be_positive"));
    }
    u64::try_from(seconds).map_err(|_| invalid("out_of_range"))
}
