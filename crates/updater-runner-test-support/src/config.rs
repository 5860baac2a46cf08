//! Temporary configuration files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A directory of property files removed on drop.
#[derive(Debug)]
pub struct TempConfig {
    dir: TempDir,
}

impl TempConfig {
    /// Create an empty directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Directory holding the files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write `name` containing one `key=value` line per entry and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write(&self, name: &str, entries: &[(&str, &str)]) -> io::Result<PathBuf> {
        let body: String = entries
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        self.write_raw(name, &body)
    }

    /// Write `name` with verbatim `contents` and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write_raw(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_renders_key_value_lines() -> io::Result<()> {
        let config = TempConfig::new()?;
        let path = config.write("runner.properties", &[("a", "1"), ("b", "x,y")])?;
        assert!(path.starts_with(config.dir()));
        assert_eq!(fs::read_to_string(path)?, "a=1\nb=x,y\n");
        Ok(())
    }
}
