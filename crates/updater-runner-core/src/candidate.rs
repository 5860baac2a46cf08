//! Updater definitions discovered in the registry and their activation readiness.

use std::error::Error as _;
use std::fmt::{self, Display, Formatter};

use tracing::warn;
use updater_runner_repository::{
    Node, PropertyValue, QueryLanguage, RepositoryError, RepositorySession, path,
};

use crate::paths::{
    DEFAULT_BATCH_SIZE, DEFAULT_THROTTLE_MS, PROP_BATCH_SIZE, PROP_PATH, PROP_QUERY,
    PROP_THROTTLE, REGISTRY_PATH, UPDATER_INFO_TYPE,
};

/// How an activated updater selects the nodes it visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationMethod {
    /// Visit the subtree rooted at a repository path.
    Path(String),
    /// Visit the results of an XPath query.
    Query(String),
}

impl ActivationMethod {
    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Query(_) => "query",
        }
    }
}

/// Validated settings of an activatable candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPlan {
    /// Node selection method.
    pub method: ActivationMethod,
    /// Nodes visited per batch.
    pub batch_size: i64,
    /// Pause between batches, in milliseconds.
    pub throttle_ms: i64,
}

/// Why a candidate cannot be activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Neither a visitor path nor a visitor query is set.
    NoActivationMethod,
    /// The visitor path is empty.
    EmptyVisitorPath,
    /// The visitor path does not resolve to a node.
    VisitorPathNotFound {
        /// Configured visitor path.
        path: String,
    },
    /// The visitor path could not be checked.
    MalformedVisitorPath {
        /// Configured visitor path.
        path: String,
    },
    /// The visitor query is empty.
    EmptyVisitorQuery,
    /// The visitor query does not parse.
    InvalidVisitorQuery {
        /// Parser detail.
        detail: String,
    },
    /// The candidate has an empty name.
    EmptyName,
    /// The candidate does not live below the registry.
    OutsideRegistry {
        /// Candidate path.
        path: String,
    },
    /// The candidate is not an updater definition.
    NotUpdaterInfo {
        /// Primary type found instead.
        primary_type: String,
    },
    /// The batch size is not an integer.
    InvalidBatchSize {
        /// Raw value.
        value: String,
    },
    /// The throttle is not an integer.
    InvalidThrottle {
        /// Raw value.
        value: String,
    },
    /// The repository failed while validating.
    RepositoryFailure {
        /// Error detail.
        detail: String,
    },
}

impl RejectionReason {
    /// Machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoActivationMethod => "no_activation_method",
            Self::EmptyVisitorPath => "empty_visitor_path",
            Self::VisitorPathNotFound { .. } => "visitor_path_not_found",
            Self::MalformedVisitorPath { .. } => "malformed_visitor_path",
            Self::EmptyVisitorQuery => "empty_visitor_query",
            Self::InvalidVisitorQuery { .. } => "invalid_visitor_query",
            Self::EmptyName => "empty_name",
            Self::OutsideRegistry { .. } => "outside_registry",
            Self::NotUpdaterInfo { .. } => "not_updater_info",
            Self::InvalidBatchSize { .. } => "invalid_batch_size",
            Self::InvalidThrottle { .. } => "invalid_throttle",
            Self::RepositoryFailure { .. } => "repository_failure",
        }
    }
}

impl Display for RejectionReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::VisitorPathNotFound { path }
            | Self::MalformedVisitorPath { path }
            | Self::OutsideRegistry { path } => write!(formatter, "{} ({path})", self.code()),
            Self::InvalidVisitorQuery { detail } | Self::RepositoryFailure { detail } => {
                write!(formatter, "{}: {detail}", self.code())
            }
            Self::NotUpdaterInfo { primary_type } => {
                write!(formatter, "{} ({primary_type})", self.code())
            }
            Self::InvalidBatchSize { value } | Self::InvalidThrottle { value } => {
                write!(formatter, "{} ({value})", self.code())
            }
            Self::NoActivationMethod
            | Self::EmptyVisitorPath
            | Self::EmptyVisitorQuery
            | Self::EmptyName => formatter.write_str(self.code()),
        }
    }
}

/// Outcome of validating a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The candidate may be copied to the queue.
    Activatable(ActivationPlan),
    /// The candidate must be left alone.
    Rejected(RejectionReason),
}

/// One updater definition found in the registry.
#[derive(Debug, Clone)]
pub struct UpdaterCandidate {
    node: Node,
}

impl UpdaterCandidate {
    /// Wrap a registry node.
    #[must_use]
    pub const fn new(node: Node) -> Self {
        Self { node }
    }

    /// Updater name (the node name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Absolute path of the definition.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.node.path
    }

    /// Check whether the candidate can be activated.
    ///
    /// Never fails: problems, including repository errors, come back as
    /// [`Validation::Rejected`] and are logged with the candidate name.
    pub async fn validate<S>(&self, session: &S) -> Validation
    where
        S: RepositorySession + ?Sized,
    {
        match self.check(session).await {
            Ok(plan) => Validation::Activatable(plan),
            Err(reason) => {
                warn!(
                    updater = %self.name(),
                    path = %self.path(),
                    reason = reason.code(),
                    detail = %reason,
                    "updater rejected"
                );
                Validation::Rejected(reason)
            }
        }
    }

    async fn check<S>(&self, session: &S) -> Result<ActivationPlan, RejectionReason>
    where
        S: RepositorySession + ?Sized,
    {
        let method = self.method()?;
        match &method {
            ActivationMethod::Path(visitor_path) => {
                check_visitor_path(session, visitor_path).await?;
            }
            ActivationMethod::Query(statement) => {
                check_visitor_query(session, statement).await?;
            }
        }

        if self.name().is_empty() {
            return Err(RejectionReason::EmptyName);
        }
        if !path::is_descendant(self.path(), REGISTRY_PATH) {
            return Err(RejectionReason::OutsideRegistry {
                path: self.path().to_string(),
            });
        }
        if !self.node.is_node_type(UPDATER_INFO_TYPE) {
            return Err(RejectionReason::NotUpdaterInfo {
                primary_type: self.node.primary_type.clone(),
            });
        }
        let batch_size = self
            .long_property(PROP_BATCH_SIZE, DEFAULT_BATCH_SIZE)
            .map_err(|value| RejectionReason::InvalidBatchSize { value })?;
        let throttle_ms = self
            .long_property(PROP_THROTTLE, DEFAULT_THROTTLE_MS)
            .map_err(|value| RejectionReason::InvalidThrottle { value })?;

        Ok(ActivationPlan {
            method,
            batch_size,
            throttle_ms,
        })
    }

    /// A non-empty query wins, then a non-empty path. Empty values only decide the rejection.
    fn method(&self) -> Result<ActivationMethod, RejectionReason> {
        let statement = self.node.string_property(PROP_QUERY);
        let visitor_path = self.node.string_property(PROP_PATH);
        match (statement, visitor_path) {
            (Some(statement), _) if !statement.is_empty() => {
                Ok(ActivationMethod::Query(statement))
            }
            (_, Some(visitor_path)) if !visitor_path.is_empty() => {
                Ok(ActivationMethod::Path(visitor_path))
            }
            (Some(_), _) => Err(RejectionReason::EmptyVisitorQuery),
            (None, Some(_)) => Err(RejectionReason::EmptyVisitorPath),
            (None, None) => Err(RejectionReason::NoActivationMethod),
        }
    }

    fn long_property(&self, name: &str, default: i64) -> Result<i64, String> {
        match self.node.property(name) {
            None => Ok(default),
            Some(PropertyValue::Long(value)) => Ok(*value),
            Some(PropertyValue::String(raw)) => raw.parse().map_err(|_| raw.clone()),
            Some(other @ PropertyValue::Boolean(_)) => Err(other.to_string()),
        }
    }
}

async fn check_visitor_path<S>(session: &S, visitor_path: &str) -> Result<(), RejectionReason>
where
    S: RepositorySession + ?Sized,
{
    if visitor_path.is_empty() {
        return Err(RejectionReason::EmptyVisitorPath);
    }
    match session.node_exists(visitor_path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(RejectionReason::VisitorPathNotFound {
            path: visitor_path.to_string(),
        }),
        Err(RepositoryError::MalformedPath { .. }) => {
            Err(RejectionReason::MalformedVisitorPath {
                path: visitor_path.to_string(),
            })
        }
        Err(err) => Err(RejectionReason::RepositoryFailure {
            detail: describe(&err),
        }),
    }
}

async fn check_visitor_query<S>(session: &S, statement: &str) -> Result<(), RejectionReason>
where
    S: RepositorySession + ?Sized,
{
    if statement.is_empty() {
        return Err(RejectionReason::EmptyVisitorQuery);
    }
    match session.validate_query(statement, QueryLanguage::Xpath).await {
        Ok(()) => Ok(()),
        Err(RepositoryError::InvalidQuery { reason, .. }) => {
            Err(RejectionReason::InvalidVisitorQuery { detail: reason })
        }
        Err(err) => Err(RejectionReason::RepositoryFailure {
            detail: describe(&err),
        }),
    }
}

/// Render an error with its source chain.
pub(crate) fn describe(err: &RepositoryError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
