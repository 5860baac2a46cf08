//! Repository data carriers shared by every session implementation.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Login credentials for a repository session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub user: String,
    /// Login password.
    pub password: String,
}

impl Credentials {
    /// Build credentials from a user and password.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Query languages a session can be asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    /// JCR XPath syntax.
    Xpath,
}

impl QueryLanguage {
    /// Wire representation of the language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xpath => "xpath",
        }
    }
}

/// Single-valued node property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean property.
    Boolean(bool),
    /// 64-bit integer property.
    Long(i64),
    /// String property.
    String(String),
}

impl PropertyValue {
    /// Borrow the value when it is a string property.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            Self::Boolean(_) | Self::Long(_) => None,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => Display::fmt(value, formatter),
            Self::Long(value) => Display::fmt(value, formatter),
            Self::String(value) => formatter.write_str(value),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Snapshot of a repository node as seen by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node name (last path segment).
    pub name: String,
    /// Absolute node path.
    pub path: String,
    /// Primary node type.
    pub primary_type: String,
    /// Mixin node types.
    #[serde(default)]
    pub mixin_types: Vec<String>,
    /// Node properties keyed by qualified name.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Node {
    /// Whether the node carries `node_type` as its primary type or as a mixin.
    #[must_use]
    pub fn is_node_type(&self, node_type: &str) -> bool {
        self.primary_type == node_type || self.mixin_types.iter().any(|mixin| mixin == node_type)
    }

    /// Look up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// String rendering of a property, converting non-string values.
    #[must_use]
    pub fn string_property(&self, name: &str) -> Option<String> {
        self.property(name).map(ToString::to_string)
    }
}

/// Transient write held by a session until it is saved or discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Change {
    /// Copy the subtree rooted at `src` to `dest`.
    Copy {
        /// Source path.
        src: String,
        /// Destination path; must not exist yet.
        dest: String,
    },
    /// Set a single property on an existing node.
    #[serde(rename_all = "camelCase")]
    SetProperty {
        /// Node path.
        path: String,
        /// Property name.
        name: String,
        /// New value.
        value: PropertyValue,
    },
}
