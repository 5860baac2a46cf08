use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use updater_runner_config::{ConfigError, load_files, load_run_configuration};

fn write(dir: &TempDir, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn later_files_override_earlier_ones() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let base = write(
        &dir,
        "runner.properties",
        "repository.url=http://localhost:8080/repository\n\
         repository.user=admin\n\
         repository.pass=admin\n\
         groovy.scripts=fixContentUpdater,\n",
    )?;
    let overlay = write(
        &dir,
        "prod.properties",
        "repository.url=http://cms.internal:8080/repository\n\
         wait.until.done=true\n\
         max.sleep.interval=8\n",
    )?;

    let config = load_run_configuration(&[base, overlay])?;
    assert_eq!(config.repository.url, "http://cms.internal:8080/repository");
    assert_eq!(config.repository.user, "admin");
    assert!(config.wait_until_done);
    assert_eq!(config.max_sleep_interval_secs, 8);
    assert_eq!(config.selected_updaters.names(), ["fixContentUpdater"]);
    Ok(())
}

#[test]
fn unreadable_file_reports_io_error_with_path() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let missing = dir.path().join("absent.properties");
    let err = load_files(std::slice::from_ref(&missing)).expect_err("missing file must fail");
    match err {
        ConfigError::Io { path, operation, .. } => {
            assert_eq!(path, missing);
            assert_eq!(operation, "config.read");
        }
        other => anyhow::bail!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn invalid_script_list_is_rejected_after_merge() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write(
        &dir,
        "runner.properties",
        "repository.url=http://localhost:8080/repository\n\
         repository.user=admin\n\
         repository.pass=admin\n\
         groovy.scripts=onlyOne\n",
    )?;
    let err = load_run_configuration(&[path]).expect_err("single name without comma");
    assert!(matches!(
        err,
        ConfigError::InvalidField {
            key: "groovy.scripts",
            ..
        }
    ));
    Ok(())
}
