//! The XPath subset understood by the in-memory repository.
//!
//! Accepted shape: `[/jcr:root]<scope>(//|/)<node-test>[predicate]*[ order by ...]` where the
//! node test is `*`, a qualified name, or `element(<name|*>[, <type>])`. Predicates and
//! ordering are syntax-checked; the in-memory store refuses to evaluate predicates.

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::Node;
use crate::path::{self, ROOT};

const JCR_ROOT: &str = "/jcr:root";

/// Axis of the final location step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Direct children of the scope.
    Child,
    /// Any node below the scope.
    Descendant,
}

/// Parsed location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    scope: String,
    axis: Axis,
    name: Option<String>,
    node_type: Option<String>,
    predicates: Vec<String>,
}

impl PathQuery {
    /// Parse a statement.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidQuery`] when the statement is outside the subset or
    /// syntactically broken.
    pub fn parse(statement: &str) -> RepositoryResult<Self> {
        let invalid = |reason: &str| RepositoryError::invalid_query(statement, reason);

        let trimmed = statement.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty statement"));
        }
        check_balanced(trimmed).map_err(invalid)?;

        let body = trimmed
            .split_once(" order by ")
            .map_or(trimmed, |(body, _)| body.trim_end());
        let (location, predicates) = split_predicates(body).map_err(invalid)?;
        let location = location.strip_prefix(JCR_ROOT).unwrap_or(location);
        if !location.starts_with('/') {
            return Err(invalid("relative location path"));
        }

        let (scope, axis, test) = location.rfind("//").map_or_else(
            || {
                let index = location.rfind('/').unwrap_or_default();
                (&location[..index], Axis::Child, &location[index + 1..])
            },
            |index| (&location[..index], Axis::Descendant, &location[index + 2..]),
        );
        if test.contains('/') {
            return Err(invalid("unsupported location step"));
        }

        let scope = if scope.is_empty() { ROOT } else { scope };
        path::validate_absolute(scope).map_err(|_| invalid("malformed scope path"))?;
        let (name, node_type) = parse_node_test(test.trim()).map_err(invalid)?;

        Ok(Self {
            scope: scope.to_string(),
            axis,
            name,
            node_type,
            predicates,
        })
    }

    /// Scope path the query searches under.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Axis of the final step.
    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Required node type, if any.
    #[must_use]
    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }

    /// Raw predicate expressions, without brackets.
    #[must_use]
    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    /// Whether `node` satisfies the location path (predicates are not considered).
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        let in_scope = match self.axis {
            Axis::Descendant => path::is_descendant(&node.path, &self.scope),
            Axis::Child => path::parent(&node.path) == Some(self.scope.as_str()),
        };
        in_scope
            && self.name.as_deref().is_none_or(|name| name == node.name)
            && self
                .node_type
                .as_deref()
                .is_none_or(|node_type| node.is_node_type(node_type))
    }
}

fn check_balanced(statement: &str) -> Result<(), &'static str> {
    let mut expected = Vec::new();
    let mut quote: Option<char> = None;
    for c in statement.chars() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => expected.push(')'),
            '[' => expected.push(']'),
            ')' | ']' => {
                if expected.pop() != Some(c) {
                    return Err("unbalanced brackets");
                }
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal");
    }
    if !expected.is_empty() {
        return Err("unbalanced brackets");
    }
    Ok(())
}

fn split_predicates(body: &str) -> Result<(&str, Vec<String>), &'static str> {
    let Some(start) = top_level_bracket(body) else {
        return Ok((body, Vec::new()));
    };

    let mut predicates = Vec::new();
    let mut rest = &body[start..];
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if !rest.starts_with('[') {
            return Err("unexpected input after predicate");
        }
        let end = matching_bracket(rest).ok_or("unbalanced brackets")?;
        let inner = rest[1..end].trim();
        if inner.is_empty() {
            return Err("empty predicate");
        }
        predicates.push(inner.to_string());
        rest = &rest[end + 1..];
    }
    Ok((&body[..start], predicates))
}

fn top_level_bracket(body: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for (index, c) in body.char_indices() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => return Some(index),
            _ => {}
        }
    }
    None
}

fn matching_bracket(input: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for (index, c) in input.char_indices() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

type NodeTest = (Option<String>, Option<String>);

fn parse_node_test(test: &str) -> Result<NodeTest, &'static str> {
    if test.is_empty() {
        return Err("missing node test");
    }
    if test == "*" {
        return Ok((None, None));
    }
    if let Some(arguments) = test
        .strip_prefix("element(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let arguments: Vec<&str> = arguments.split(',').map(str::trim).collect();
        return match arguments.as_slice() {
            [""] | ["*"] => Ok((None, None)),
            [name] => Ok((Some(qualified_name(name)?), None)),
            ["*", node_type] => Ok((None, Some(qualified_name(node_type)?))),
            [name, node_type] => Ok((
                Some(qualified_name(name)?),
                Some(qualified_name(node_type)?),
            )),
            _ => Err("too many element() arguments"),
        };
    }
    Ok((Some(qualified_name(test)?), None))
}

fn qualified_name(value: &str) -> Result<String, &'static str> {
    let valid = !value.is_empty()
        && !value.starts_with(':')
        && !value.ends_with(':')
        && value.matches(':').count() <= 1
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.'));
    if valid {
        Ok(value.to_string())
    } else {
        Err("invalid qualified name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const REGISTRY_QUERY: &str =
        "/jcr:root/hippo:configuration/hippo:update/hippo:registry//element(*,hipposys:updaterinfo)";

    fn node(path: &str, primary_type: &str) -> Node {
        Node {
            name: path::name(path).to_string(),
            path: path.to_string(),
            primary_type: primary_type.to_string(),
            mixin_types: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn registry_query_selects_updater_info_descendants() -> RepositoryResult<()> {
        let query = PathQuery::parse(REGISTRY_QUERY)?;
        assert_eq!(
            query.scope(),
            "/hippo:configuration/hippo:update/hippo:registry"
        );
        assert_eq!(query.axis(), Axis::Descendant);
        assert_eq!(query.node_type(), Some("hipposys:updaterinfo"));

        assert!(query.matches(&node(
            "/hippo:configuration/hippo:update/hippo:registry/folder/a",
            "hipposys:updaterinfo"
        )));
        assert!(!query.matches(&node(
            "/hippo:configuration/hippo:update/hippo:registry/folder",
            "hipposys:updaterfolder"
        )));
        assert!(!query.matches(&node(
            "/hippo:configuration/hippo:update/hippo:queue/a",
            "hipposys:updaterinfo"
        )));
        Ok(())
    }

    #[test]
    fn accepts_common_visitor_queries() -> RepositoryResult<()> {
        let with_predicate =
            PathQuery::parse("//element(*, hippo:document)[@hippo:availability='live']")?;
        assert_eq!(with_predicate.scope(), ROOT);
        assert_eq!(with_predicate.predicates(), ["@hippo:availability='live'"]);

        let ordered = PathQuery::parse(
            "/jcr:root/content/documents//element(*,hippo:handle) order by @jcr:name",
        )?;
        assert_eq!(ordered.scope(), "/content/documents");

        let child = PathQuery::parse("/jcr:root/content/*")?;
        assert_eq!(child.axis(), Axis::Child);
        assert!(child.matches(&node("/content/documents", "hippostd:folder")));
        assert!(!child.matches(&node("/content/documents/x", "hippostd:folder")));
        Ok(())
    }

    #[test]
    fn rejects_broken_statements() {
        for statement in [
            "",
            "   ",
            "//element(*,hippo:document",
            "//element(*,hippo:document)]",
            "//*[@a='unterminated]",
            "content//*",
            "//element(*,a,b)",
            "//element(*,:bad)",
            "//*[]",
            "//* trailing",
        ] {
            let result = PathQuery::parse(statement);
            assert!(
                matches!(result, Err(RepositoryError::InvalidQuery { .. })),
                "statement {statement:?} should be rejected, got {result:?}"
            );
        }
    }
}
