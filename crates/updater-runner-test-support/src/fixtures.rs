//! Registry, queue and history fixtures for a [`MemoryRepository`].

use updater_runner_repository::{Credentials, MemoryRepository, PropertyValue, RepositoryResult};

/// Registry folder seeded by [`seed_registry`].
pub const REGISTRY_PATH: &str = "/hippo:configuration/hippo:update/hippo:registry";
/// Queue folder seeded by [`seed_registry`].
pub const QUEUE_PATH: &str = "/hippo:configuration/hippo:update/hippo:queue";
/// History folder seeded by [`seed_registry`].
pub const HISTORY_PATH: &str = "/hippo:configuration/hippo:update/hippo:history";

const UPDATER_INFO_TYPE: &str = "hipposys:updaterinfo";
const UPDATER_FOLDER_TYPE: &str = "hipposys:updaterfolder";

/// Credentials accepted by a fresh [`MemoryRepository`].
#[must_use]
pub fn admin() -> Credentials {
    Credentials::new("admin", "admin")
}

/// Builder for one updater definition in the registry.
#[derive(Debug, Clone)]
pub struct UpdaterFixture {
    name: String,
    folder: Option<String>,
    primary_type: String,
    properties: Vec<(String, PropertyValue)>,
}

impl UpdaterFixture {
    /// Definition without a visitor path or query.
    #[must_use]
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            folder: None,
            primary_type: UPDATER_INFO_TYPE.to_string(),
            properties: Vec::new(),
        }
    }

    /// Definition visiting the subtree at `visitor_path`.
    #[must_use]
    pub fn path(name: &str, visitor_path: &str) -> Self {
        Self::bare(name).with_property("hipposys:path", visitor_path)
    }

    /// Definition visiting the results of `statement`.
    #[must_use]
    pub fn query(name: &str, statement: &str) -> Self {
        Self::bare(name).with_property("hipposys:query", statement)
    }

    /// Add or replace a property.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.retain(|(existing, _)| existing != key);
        self.properties.push((key.to_string(), value.into()));
        self
    }

    /// Override the primary node type.
    #[must_use]
    pub fn with_primary_type(mut self, primary_type: &str) -> Self {
        self.primary_type = primary_type.to_string();
        self
    }

    /// Place the definition in a sub-folder of the registry.
    #[must_use]
    pub fn in_folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    /// Updater name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path the definition is stored at.
    #[must_use]
    pub fn registry_path(&self) -> String {
        self.folder.as_ref().map_or_else(
            || format!("{REGISTRY_PATH}/{}", self.name),
            |folder| format!("{REGISTRY_PATH}/{folder}/{}", self.name),
        )
    }
}

/// Create the registry, queue and history folders and store every fixture in the registry.
///
/// # Errors
///
/// Propagates repository errors from node creation.
pub async fn seed_registry<I>(repository: &MemoryRepository, fixtures: I) -> RepositoryResult<()>
where
    I: IntoIterator<Item = UpdaterFixture>,
{
    for folder in [REGISTRY_PATH, QUEUE_PATH, HISTORY_PATH] {
        if !repository.exists(folder).await {
            repository
                .put_node(folder, UPDATER_FOLDER_TYPE, Vec::<(String, PropertyValue)>::new())
                .await?;
        }
    }
    for fixture in fixtures {
        let path = fixture.registry_path();
        repository
            .put_node(&path, &fixture.primary_type, fixture.properties)
            .await?;
    }
    Ok(())
}

/// Record `identifier` as finished by adding it to the history folder.
///
/// # Errors
///
/// Propagates repository errors from node creation.
pub async fn mark_finished(
    repository: &MemoryRepository,
    identifier: &str,
) -> RepositoryResult<()> {
    repository
        .put_node(
            &format!("{HISTORY_PATH}/{identifier}"),
            UPDATER_INFO_TYPE,
            Vec::<(String, PropertyValue)>::new(),
        )
        .await
}

/// Names of every node currently in the queue folder.
pub async fn queued_identifiers(repository: &MemoryRepository) -> Vec<String> {
    repository
        .children(QUEUE_PATH)
        .await
        .into_iter()
        .map(|node| node.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_creates_layout_and_fixtures() -> anyhow::Result<()> {
        let repository = MemoryRepository::new();
        let nested = UpdaterFixture::query("nested", "//*").in_folder("group");
        seed_registry(
            &repository,
            [UpdaterFixture::path("plain", "/content"), nested.clone()],
        )
        .await?;

        assert!(repository.exists(QUEUE_PATH).await);
        assert!(repository.exists(HISTORY_PATH).await);
        let stored = repository
            .node(&nested.registry_path())
            .await
            .ok_or_else(|| anyhow::anyhow!("nested fixture missing"))?;
        assert_eq!(stored.primary_type, UPDATER_INFO_TYPE);
        assert_eq!(stored.string_property("hipposys:query").as_deref(), Some("//*"));
        assert!(queued_identifiers(&repository).await.is_empty());

        mark_finished(&repository, "plain-1").await?;
        assert!(repository.exists(&format!("{HISTORY_PATH}/plain-1")).await);
        Ok(())
    }

    #[test]
    fn with_property_replaces_existing_value() {
        let fixture = UpdaterFixture::path("a", "/x").with_property("hipposys:path", "/y");
        assert_eq!(
            fixture.properties,
            [("hipposys:path".to_string(), PropertyValue::from("/y"))]
        );
    }
}
