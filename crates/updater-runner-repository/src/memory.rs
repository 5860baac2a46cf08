//! In-process repository used by tests and local dry runs.
//!
//! # Design
//! - Persisted nodes live in a shared map keyed by absolute path; sessions keep their own
//!   pending change log and apply it atomically on save.
//! - Session reads see persisted state overlaid with the session's own pending changes.
//! - Fault hooks (failing saves, reads and queries) let callers exercise error paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{Change, Credentials, Node, PropertyValue, QueryLanguage};
use crate::path::{self, ROOT};
use crate::session::{Repository, RepositorySession, ensure_live};
use crate::xpath::PathQuery;

const ROOT_TYPE: &str = "rep:root";
const FOLDER_TYPE: &str = "nt:unstructured";
const LOCATION: &str = "memory";

type NodeMap = BTreeMap<String, StoredNode>;

#[derive(Debug, Clone)]
struct StoredNode {
    primary_type: String,
    properties: BTreeMap<String, PropertyValue>,
}

impl StoredNode {
    fn new(primary_type: &str) -> Self {
        Self {
            primary_type: primary_type.to_string(),
            properties: BTreeMap::new(),
        }
    }

    fn to_node(&self, path: &str) -> Node {
        Node {
            name: path::name(path).to_string(),
            path: path.to_string(),
            primary_type: self.primary_type.clone(),
            mixin_types: Vec::new(),
            properties: self.properties.clone(),
        }
    }
}

#[derive(Debug)]
struct ReadFault {
    scope: String,
    remaining_ok: usize,
}

#[derive(Debug)]
struct State {
    nodes: NodeMap,
    users: BTreeMap<String, String>,
    commits: usize,
    failing_saves: usize,
    read_faults: Vec<ReadFault>,
    failing_queries: bool,
}

impl State {
    fn new() -> Self {
        let mut nodes = NodeMap::new();
        nodes.insert(ROOT.to_string(), StoredNode::new(ROOT_TYPE));
        Self {
            nodes,
            users: BTreeMap::new(),
            commits: 0,
            failing_saves: 0,
            read_faults: Vec::new(),
            failing_queries: false,
        }
    }

    fn check_read(&mut self, path: &str) -> RepositoryResult<()> {
        for fault in &mut self.read_faults {
            if path::is_same_or_descendant(path, &fault.scope) {
                if fault.remaining_ok == 0 {
                    return Err(RepositoryError::Unavailable {
                        operation: "memory.get_node",
                        path: Some(path.to_string()),
                    });
                }
                fault.remaining_ok -= 1;
            }
        }
        Ok(())
    }
}

/// Shared in-memory repository; clones observe the same state.
///
/// With no registered users every login succeeds; after [`MemoryRepository::with_users`]
/// only the registered pairs are accepted.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Empty repository containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    /// Empty repository that only accepts the given user and password pairs.
    #[must_use]
    pub fn with_users<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let mut state = State::new();
        state.users = users
            .into_iter()
            .map(|(user, password)| (user.into(), password.into()))
            .collect();
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Create or replace a node, creating missing ancestors as unstructured folders.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MalformedPath`] for invalid paths or the root.
    pub async fn put_node<I, K>(
        &self,
        node_path: &str,
        primary_type: &str,
        properties: I,
    ) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = (K, PropertyValue)> + Send,
        K: Into<String>,
    {
        path::validate_absolute(node_path)?;
        if node_path == ROOT {
            return Err(RepositoryError::MalformedPath {
                path: node_path.to_string(),
                reason: "root_not_replaceable",
            });
        }
        let mut stored = StoredNode::new(primary_type);
        stored.properties = properties
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();

        let mut state = self.state.lock().await;
        let mut ancestor = path::parent(node_path);
        while let Some(current) = ancestor {
            state
                .nodes
                .entry(current.to_string())
                .or_insert_with(|| StoredNode::new(FOLDER_TYPE));
            ancestor = path::parent(current);
        }
        state.nodes.insert(node_path.to_string(), stored);
        Ok(())
    }

    /// Set a property on a persisted node directly, bypassing sessions.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the node does not exist.
    pub async fn set_property(
        &self,
        node_path: &str,
        name: &str,
        value: PropertyValue,
    ) -> RepositoryResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .nodes
            .get_mut(node_path)
            .ok_or_else(|| RepositoryError::not_found(node_path))?;
        stored.properties.insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a persisted node and its subtree; returns whether anything was removed.
    pub async fn remove_node(&self, node_path: &str) -> bool {
        if node_path == ROOT {
            return false;
        }
        let mut state = self.state.lock().await;
        let before = state.nodes.len();
        state
            .nodes
            .retain(|candidate, _| !path::is_same_or_descendant(candidate, node_path));
        state.nodes.len() != before
    }

    /// Persisted node at `node_path`, if any.
    pub async fn node(&self, node_path: &str) -> Option<Node> {
        self.state
            .lock()
            .await
            .nodes
            .get(node_path)
            .map(|stored| stored.to_node(node_path))
    }

    /// Whether a persisted node exists at `node_path`.
    pub async fn exists(&self, node_path: &str) -> bool {
        self.state.lock().await.nodes.contains_key(node_path)
    }

    /// Persisted direct children of `node_path`, in path order.
    pub async fn children(&self, node_path: &str) -> Vec<Node> {
        self.state
            .lock()
            .await
            .nodes
            .iter()
            .filter(|(candidate, _)| path::parent(candidate) == Some(node_path))
            .map(|(candidate, stored)| stored.to_node(candidate))
            .collect()
    }

    /// Number of successful saves that persisted at least one change.
    pub async fn commit_count(&self) -> usize {
        self.state.lock().await.commits
    }

    /// Make the next `count` saves fail with [`RepositoryError::Commit`].
    pub async fn fail_next_saves(&self, count: usize) {
        self.state.lock().await.failing_saves = count;
    }

    /// Let `after` more reads under `scope` succeed, then fail every later one.
    pub async fn fail_reads_under(&self, scope: &str, after: usize) {
        self.state.lock().await.read_faults.push(ReadFault {
            scope: scope.to_string(),
            remaining_ok: after,
        });
    }

    /// Toggle failure of every query.
    pub async fn fail_queries(&self, failing: bool) {
        self.state.lock().await.failing_queries = failing;
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    type Session = MemorySession;

    fn location(&self) -> &str {
        LOCATION
    }

    async fn login(&self, credentials: &Credentials) -> RepositoryResult<MemorySession> {
        let state = self.state.lock().await;
        let accepted = state.users.is_empty()
            || state.users.get(&credentials.user) == Some(&credentials.password);
        if !accepted {
            return Err(RepositoryError::LoginRejected {
                user: credentials.user.clone(),
            });
        }
        drop(state);
        info!(user = %credentials.user, location = LOCATION, "repository session opened");
        Ok(MemorySession {
            state: Arc::clone(&self.state),
            user_id: credentials.user.clone(),
            pending: Mutex::new(Vec::new()),
            live: AtomicBool::new(true),
        })
    }
}

/// Session over a [`MemoryRepository`].
#[derive(Debug)]
pub struct MemorySession {
    state: Arc<Mutex<State>>,
    user_id: String,
    pending: Mutex<Vec<Change>>,
    live: AtomicBool,
}

impl MemorySession {
    fn ensure_live(&self) -> RepositoryResult<()> {
        ensure_live(self.live.load(Ordering::Acquire))
    }

    fn overlay(nodes: &NodeMap, pending: &[Change]) -> RepositoryResult<NodeMap> {
        let mut view = nodes.clone();
        for change in pending {
            apply_change(&mut view, change)?;
        }
        Ok(view)
    }

    async fn record(&self, change: Change) -> RepositoryResult<()> {
        self.ensure_live()?;
        let state = self.state.lock().await;
        let mut pending = self.pending.lock().await;
        let mut view = Self::overlay(&state.nodes, &pending)?;
        drop(state);
        apply_change(&mut view, &change)?;
        pending.push(change);
        Ok(())
    }
}

#[async_trait]
impl RepositorySession for MemorySession {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn query(
        &self,
        statement: &str,
        language: QueryLanguage,
    ) -> RepositoryResult<Vec<Node>> {
        self.ensure_live()?;
        let query = PathQuery::parse(statement)?;
        if !query.predicates().is_empty() {
            return Err(RepositoryError::Unsupported {
                operation: "memory.query.predicates",
                value: Some(statement.to_string()),
            });
        }
        let view = {
            let state = self.state.lock().await;
            if state.failing_queries {
                return Err(RepositoryError::Unavailable {
                    operation: "memory.query",
                    path: None,
                });
            }
            let pending = self.pending.lock().await;
            Self::overlay(&state.nodes, &pending)?
        };
        let nodes: Vec<Node> = view
            .iter()
            .map(|(node_path, stored)| stored.to_node(node_path))
            .filter(|node| query.matches(node))
            .collect();
        debug!(
            language = language.as_str(),
            statement,
            matches = nodes.len(),
            "memory query executed"
        );
        Ok(nodes)
    }

    async fn validate_query(
        &self,
        statement: &str,
        _language: QueryLanguage,
    ) -> RepositoryResult<()> {
        self.ensure_live()?;
        PathQuery::parse(statement).map(|_| ())
    }

    async fn get_node(&self, node_path: &str) -> RepositoryResult<Node> {
        self.ensure_live()?;
        path::validate_absolute(node_path)?;
        let view = {
            let mut state = self.state.lock().await;
            state.check_read(node_path)?;
            let pending = self.pending.lock().await;
            if pending.is_empty() {
                return state
                    .nodes
                    .get(node_path)
                    .map(|stored| stored.to_node(node_path))
                    .ok_or_else(|| RepositoryError::not_found(node_path));
            }
            Self::overlay(&state.nodes, &pending)?
        };
        view.get(node_path)
            .map(|stored| stored.to_node(node_path))
            .ok_or_else(|| RepositoryError::not_found(node_path))
    }

    async fn copy(&self, src: &str, dest: &str) -> RepositoryResult<()> {
        self.record(Change::Copy {
            src: src.to_string(),
            dest: dest.to_string(),
        })
        .await
    }

    async fn set_property(
        &self,
        node_path: &str,
        name: &str,
        value: PropertyValue,
    ) -> RepositoryResult<()> {
        self.record(Change::SetProperty {
            path: node_path.to_string(),
            name: name.to_string(),
            value,
        })
        .await
    }

    async fn save(&self) -> RepositoryResult<()> {
        self.ensure_live()?;
        let mut state = self.state.lock().await;
        let mut pending = self.pending.lock().await;
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(RepositoryError::Commit {
                reason: "injected save failure".to_string(),
            });
        }
        if pending.is_empty() {
            return Ok(());
        }
        let committed = Self::overlay(&state.nodes, &pending)?;
        state.nodes = committed;
        state.commits += 1;
        debug!(user = %self.user_id, changes = pending.len(), "memory session saved");
        pending.clear();
        Ok(())
    }

    async fn refresh(&self, keep_changes: bool) -> RepositoryResult<()> {
        self.ensure_live()?;
        if !keep_changes {
            self.pending.lock().await.clear();
        }
        Ok(())
    }

    async fn logout(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            self.pending.lock().await.clear();
            info!(user = %self.user_id, "repository session closed");
        }
    }
}

fn apply_change(nodes: &mut NodeMap, change: &Change) -> RepositoryResult<()> {
    match change {
        Change::Copy { src, dest } => {
            path::validate_absolute(src)?;
            path::validate_absolute(dest)?;
            if !nodes.contains_key(src.as_str()) {
                return Err(RepositoryError::not_found(src));
            }
            if nodes.contains_key(dest.as_str()) {
                return Err(RepositoryError::ItemExists { path: dest.clone() });
            }
            if path::is_same_or_descendant(dest, src) {
                return Err(RepositoryError::MalformedPath {
                    path: dest.clone(),
                    reason: "destination_inside_source",
                });
            }
            let parent = path::parent(dest).unwrap_or(ROOT);
            if !nodes.contains_key(parent) {
                return Err(RepositoryError::not_found(parent));
            }
            let copies: Vec<(String, StoredNode)> = nodes
                .iter()
                .filter(|(candidate, _)| path::is_same_or_descendant(candidate, src))
                .map(|(candidate, stored)| {
                    (format!("{dest}{}", &candidate[src.len()..]), stored.clone())
                })
                .collect();
            nodes.extend(copies);
            Ok(())
        }
        Change::SetProperty { path, name, value } => {
            let stored = nodes
                .get_mut(path.as_str())
                .ok_or_else(|| RepositoryError::not_found(path))?;
            stored.properties.insert(name.clone(), value.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "/hippo:configuration/hippo:update/hippo:registry";
    const QUEUE: &str = "/hippo:configuration/hippo:update/hippo:queue";

    async fn seeded() -> RepositoryResult<MemoryRepository> {
        let repository = MemoryRepository::new();
        repository
            .put_node(
                &format!("{REGISTRY}/a"),
                "hipposys:updaterinfo",
                [("hipposys:path", PropertyValue::from("/content"))],
            )
            .await?;
        repository.put_node(QUEUE, FOLDER_TYPE, Vec::<(String, PropertyValue)>::new()).await?;
        Ok(repository)
    }

    #[tokio::test]
    async fn copy_stays_transient_until_save() -> anyhow::Result<()> {
        let repository = seeded().await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        let src = format!("{REGISTRY}/a");
        let dest = format!("{QUEUE}/a-1");

        session.copy(&src, &dest).await?;
        session
            .set_property(&dest, "hipposys:dryrun", false.into())
            .await?;
        assert!(session.node_exists(&dest).await?);
        assert!(!repository.exists(&dest).await);

        session.save().await?;
        let copied = repository.node(&dest).await.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(copied.property("hipposys:dryrun"), Some(&PropertyValue::Boolean(false)));
        assert_eq!(copied.string_property("hipposys:path").as_deref(), Some("/content"));
        assert_eq!(repository.commit_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_discards_pending_changes() -> anyhow::Result<()> {
        let repository = seeded().await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        let dest = format!("{QUEUE}/a-1");
        session.copy(&format!("{REGISTRY}/a"), &dest).await?;
        session.refresh(false).await?;
        session.save().await?;
        assert!(!repository.exists(&dest).await);
        assert_eq!(repository.commit_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn copy_rejects_existing_destination_and_missing_source() -> anyhow::Result<()> {
        let repository = seeded().await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        let err = session
            .copy(&format!("{REGISTRY}/a"), QUEUE)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("copy onto existing node succeeded"))?;
        assert!(matches!(err, RepositoryError::ItemExists { .. }));

        let err = session
            .copy(&format!("{REGISTRY}/missing"), &format!("{QUEUE}/x"))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("copy of missing node succeeded"))?;
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn injected_save_failure_keeps_state_untouched() -> anyhow::Result<()> {
        let repository = seeded().await?;
        repository.fail_next_saves(1).await;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        let dest = format!("{QUEUE}/a-1");
        session.copy(&format!("{REGISTRY}/a"), &dest).await?;
        assert!(matches!(
            session.save().await,
            Err(RepositoryError::Commit { .. })
        ));
        assert!(!repository.exists(&dest).await);
        Ok(())
    }

    #[tokio::test]
    async fn login_checks_registered_users() -> anyhow::Result<()> {
        let repository = MemoryRepository::with_users([("admin", "admin")]);
        assert!(matches!(
            repository.login(&Credentials::new("admin", "wrong")).await,
            Err(RepositoryError::LoginRejected { .. })
        ));
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        assert_eq!(session.user_id(), "admin");
        session.logout().await;
        assert!(!session.is_live().await);
        assert!(matches!(
            session.get_node(ROOT).await,
            Err(RepositoryError::SessionClosed)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn every_registered_user_is_accepted_by_clones() -> anyhow::Result<()> {
        let repository = MemoryRepository::with_users([("admin", "admin"), ("editor", "secret")]);
        let shared = repository.clone();
        for (user, password) in [("admin", "admin"), ("editor", "secret")] {
            let session = shared.login(&Credentials::new(user, password)).await?;
            assert_eq!(session.user_id(), user);
            session.logout().await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn read_faults_trigger_after_allowance() -> anyhow::Result<()> {
        let repository = seeded().await?;
        repository.fail_reads_under(QUEUE, 1).await;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        assert!(session.node_exists(QUEUE).await?);
        assert!(matches!(
            session.node_exists(QUEUE).await,
            Err(RepositoryError::Unavailable { .. })
        ));
        assert!(session.node_exists(REGISTRY).await?);
        Ok(())
    }

    #[tokio::test]
    async fn query_refuses_predicates() -> anyhow::Result<()> {
        let repository = seeded().await?;
        let session = repository.login(&Credentials::new("admin", "admin")).await?;
        session
            .validate_query("//element(*,hippo:document)[@a='b']", QueryLanguage::Xpath)
            .await?;
        assert!(matches!(
            session
                .query("//element(*,hippo:document)[@a='b']", QueryLanguage::Xpath)
                .await,
            Err(RepositoryError::Unsupported { .. })
        ));
        Ok(())
    }
}
