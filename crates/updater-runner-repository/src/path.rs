//! Absolute repository path helpers.

use crate::error::{RepositoryError, RepositoryResult};

/// Root path of every repository.
pub const ROOT: &str = "/";

/// Check that `path` is absolute, has no empty segments and no trailing slash.
///
/// # Errors
///
/// Returns [`RepositoryError::MalformedPath`] describing the first violation.
pub fn validate_absolute(path: &str) -> RepositoryResult<()> {
    let malformed = |reason| RepositoryError::MalformedPath {
        path: path.to_string(),
        reason,
    };
    if path == ROOT {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(malformed("not_absolute"));
    };
    if rest.split('/').any(str::is_empty) {
        return Err(malformed("empty_segment"));
    }
    if rest.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(malformed("relative_segment"));
    }
    Ok(())
}

/// Whether `path` lies strictly below `ancestor`.
#[must_use]
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return path != ROOT && path.starts_with('/');
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}

/// Whether `path` is `ancestor` itself or lies below it.
#[must_use]
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor || is_descendant(path, ancestor)
}

/// Append a child name to a parent path.
#[must_use]
pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Last segment of a path; empty for the root.
#[must_use]
pub fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Parent of a path, or `None` for the root.
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(index) => Some(&path[..index]),
        None => None,
    }
}
