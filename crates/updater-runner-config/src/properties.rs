//! Parser for Java-style `.properties` documents.
//!
//! Supports `key=value`, `key: value` and `key value` entries, `#`/`!` comment lines,
//! backslash line continuations and the `\t \n \r \f \uXXXX` escapes.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Flat key/value view of one or more properties documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a properties document. `origin` is only used to annotate syntax errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Syntax`] when an escape sequence is malformed.
    pub fn parse(input: &str, origin: Option<&Path>) -> ConfigResult<Self> {
        let mut entries = BTreeMap::new();
        let mut lines = input.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line = raw.trim_start_matches(is_blank);
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let line_number = index + 1;
            let mut logical = String::new();
            let mut current = line;
            loop {
                if !has_continuation(current) {
                    logical.push_str(current);
                    break;
                }
                logical.push_str(&current[..current.len() - 1]);
                match lines.next() {
                    Some((_, next)) => current = next.trim_start_matches(is_blank),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            let key = unescape(key, origin, line_number)?;
            let value = unescape(value, origin, line_number)?;
            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or replace a single entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Iterate over the known keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

const fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn has_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

fn split_entry(logical: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = logical.len();
    for (index, c) in logical.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = index;
            break;
        }
    }

    let key = &logical[..key_end];
    let mut rest = logical[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str, origin: Option<&Path>, line: usize) -> ConfigResult<String> {
    let syntax = |reason| ConfigError::Syntax {
        path: origin.map(Path::to_path_buf),
        line,
        reason,
    };

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                if digits.chars().count() < 4 {
                    return Err(syntax("unterminated_unicode_escape"));
                }
                let decoded = u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| syntax("invalid_unicode_escape"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_separator_styles_and_comments() -> ConfigResult<()> {
        let doc = "\
# connection
repository.url=rmi://localhost:1099/hipporepository
repository.user : admin
! legacy comment style
repository.pass   admin
groovy.scripts = fixContentUpdater, other,
";
        let props = Properties::parse(doc, None)?;
        assert_eq!(
            props.get("repository.url"),
            Some("rmi://localhost:1099/hipporepository")
        );
        assert_eq!(props.get("repository.user"), Some("admin"));
        assert_eq!(props.get("repository.pass"), Some("admin"));
        assert_eq!(
            props.get("groovy.scripts"),
            Some("fixContentUpdater, other,")
        );
        assert_eq!(props.len(), 4);
        Ok(())
    }

    #[test]
    fn joins_continuation_lines_and_strips_leading_blanks() -> ConfigResult<()> {
        let doc = "groovy.scripts = first,\\\n    second,\\\n\tthird\n";
        let props = Properties::parse(doc, None)?;
        assert_eq!(props.get("groovy.scripts"), Some("first,second,third"));
        Ok(())
    }

    #[test]
    fn even_trailing_backslashes_do_not_continue() -> ConfigResult<()> {
        let doc = "path=C:\\\\\nnext=value\n";
        let props = Properties::parse(doc, None)?;
        assert_eq!(props.get("path"), Some("C:\\"));
        assert_eq!(props.get("next"), Some("value"));
        Ok(())
    }

    #[test]
    fn decodes_escapes_in_keys_and_values() -> ConfigResult<()> {
        let doc = "odd\\ key=tab\\there\nunicode=caf\\u00e9\nsep\\=key==value\n";
        let props = Properties::parse(doc, None)?;
        assert_eq!(props.get("odd key"), Some("tab\there"));
        assert_eq!(props.get("unicode"), Some("café"));
        assert_eq!(props.get("sep=key"), Some("=value"));
        Ok(())
    }

    #[test]
    fn key_without_value_maps_to_empty_string() -> ConfigResult<()> {
        let props = Properties::parse("wait.until.done\n", None)?;
        assert_eq!(props.get("wait.until.done"), Some(""));
        Ok(())
    }

    #[test]
    fn rejects_truncated_unicode_escape_with_location() {
        let err = Properties::parse("a=1\nb=\\u12\n", Some(Path::new("runner.properties")))
            .expect_err("truncated escape must fail");
        match err {
            ConfigError::Syntax { line, reason, path } => {
                assert_eq!(line, 2);
                assert_eq!(reason, "unterminated_unicode_escape");
                assert_eq!(path.as_deref(), Some(Path::new("runner.properties")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn merge_prefers_later_values() {
        let mut base: Properties = [("a", "1"), ("b", "2")].into_iter().collect();
        let overlay: Properties = [("b", "3"), ("c", "4")].into_iter().collect();
        base.merge(overlay);
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
