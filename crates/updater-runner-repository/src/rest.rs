//! HTTP/JSON transport for a remote content repository.
//!
//! # Design
//! - Every request carries basic authentication for the session's credentials.
//! - Writes are buffered in a transient change log and posted as one batch on save.
//! - Reads go to the server and therefore only observe persisted state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{Change, Credentials, Node, PropertyValue, QueryLanguage};
use crate::path;
use crate::session::{Repository, RepositorySession, ensure_live};

const SESSION_ENDPOINT: &str = "session";
const QUERY_ENDPOINT: &str = "query";
const VALIDATE_ENDPOINT: &str = "query/validate";
const NODES_ENDPOINT: &str = "nodes";
const CHANGES_ENDPOINT: &str = "changes";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    user_id: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    statement: &'a str,
    language: QueryLanguage,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    nodes: Vec<Node>,
}

#[derive(Serialize)]
struct ChangeBatch<'a> {
    changes: &'a [Change],
}

/// Repository reached over HTTP.
#[derive(Debug, Clone)]
pub struct RestRepository {
    client: Client,
    base: Url,
    location: String,
}

impl RestRepository {
    /// Build a transport for `location` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidLocation`] when the location is not a URL and
    /// [`RepositoryError::ClientBuild`] when the HTTP client cannot be constructed.
    pub fn new(location: &str, timeout: Duration) -> RepositoryResult<Self> {
        let trimmed = location.trim();
        let normalised = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base = Url::parse(&normalised).map_err(|source| RepositoryError::InvalidLocation {
            value: location.to_string(),
            source,
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RepositoryError::ClientBuild { source })?;
        Ok(Self {
            client,
            base,
            location: location.to_string(),
        })
    }
}

#[async_trait]
impl Repository for RestRepository {
    type Session = RestSession;

    fn location(&self) -> &str {
        &self.location
    }

    async fn login(&self, credentials: &Credentials) -> RepositoryResult<RestSession> {
        let transport = Transport {
            client: self.client.clone(),
            base: self.base.clone(),
            credentials: credentials.clone(),
        };
        let response = transport
            .send("session.login", SESSION_ENDPOINT, |client, url| client.get(url))
            .await?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(RepositoryError::LoginRejected {
                user: credentials.user.clone(),
            });
        }
        let response = transport.ensure_success("session.login", SESSION_ENDPOINT, response)?;
        let info: SessionInfo = decode("session.login", response).await?;
        info!(user = %info.user_id, location = %self.location, "repository session opened");
        Ok(RestSession {
            transport,
            user_id: info.user_id,
            pending: Mutex::new(Vec::new()),
            live: AtomicBool::new(true),
        })
    }
}

#[derive(Debug)]
struct Transport {
    client: Client,
    base: Url,
    credentials: Credentials,
}

impl Transport {
    fn endpoint(&self, segment: &str) -> RepositoryResult<Url> {
        self.base
            .join(segment)
            .map_err(|source| RepositoryError::InvalidLocation {
                value: segment.to_string(),
                source,
            })
    }

    async fn send<F>(
        &self,
        operation: &'static str,
        segment: &str,
        build: F,
    ) -> RepositoryResult<Response>
    where
        F: FnOnce(&Client, Url) -> RequestBuilder + Send,
    {
        let url = self.endpoint(segment)?;
        let rendered = url.to_string();
        build(&self.client, url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|source| RepositoryError::Http {
                operation,
                url: rendered,
                source,
            })
    }

    fn ensure_success(
        &self,
        operation: &'static str,
        segment: &str,
        response: Response,
    ) -> RepositoryResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(RepositoryError::HttpStatus {
                operation,
                url: self
                    .endpoint(segment)
                    .map_or_else(|_| segment.to_string(), |url| url.to_string()),
                status: response.status().as_u16(),
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> RepositoryResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|source| RepositoryError::Decode { operation, source })
}

async fn body_text(response: Response) -> String {
    response
        .text()
        .await
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Session against a [`RestRepository`].
#[derive(Debug)]
pub struct RestSession {
    transport: Transport,
    user_id: String,
    pending: Mutex<Vec<Change>>,
    live: AtomicBool,
}

impl RestSession {
    fn ensure_live(&self) -> RepositoryResult<()> {
        ensure_live(self.live.load(Ordering::Acquire))
    }

    async fn post_statement(
        &self,
        operation: &'static str,
        segment: &str,
        statement: &str,
        language: QueryLanguage,
    ) -> RepositoryResult<Response> {
        self.ensure_live()?;
        let body = QueryRequest {
            statement,
            language,
        };
        let response = self
            .transport
            .send(operation, segment, |client, url| client.post(url).json(&body))
            .await?;
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(RepositoryError::invalid_query(
                statement,
                body_text(response).await,
            ));
        }
        self.transport.ensure_success(operation, segment, response)
    }
}

#[async_trait]
impl RepositorySession for RestSession {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn is_live(&self) -> bool {
        if !self.live.load(Ordering::Acquire) {
            return false;
        }
        self.transport
            .send("session.ping", SESSION_ENDPOINT, |client, url| client.get(url))
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    async fn query(
        &self,
        statement: &str,
        language: QueryLanguage,
    ) -> RepositoryResult<Vec<Node>> {
        let response = self
            .post_statement("query.execute", QUERY_ENDPOINT, statement, language)
            .await?;
        let decoded: QueryResponse = decode("query.execute", response).await?;
        debug!(statement, matches = decoded.nodes.len(), "repository query executed");
        Ok(decoded.nodes)
    }

    async fn validate_query(
        &self,
        statement: &str,
        language: QueryLanguage,
    ) -> RepositoryResult<()> {
        self.post_statement("query.validate", VALIDATE_ENDPOINT, statement, language)
            .await
            .map(|_| ())
    }

    async fn get_node(&self, node_path: &str) -> RepositoryResult<Node> {
        self.ensure_live()?;
        path::validate_absolute(node_path)?;
        let response = self
            .transport
            .send("nodes.get", NODES_ENDPOINT, |client, url| {
                client.get(url).query(&[("path", node_path)])
            })
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RepositoryError::not_found(node_path));
        }
        let response = self
            .transport
            .ensure_success("nodes.get", NODES_ENDPOINT, response)?;
        decode("nodes.get", response).await
    }

    async fn copy(&self, src: &str, dest: &str) -> RepositoryResult<()> {
        self.ensure_live()?;
        path::validate_absolute(src)?;
        path::validate_absolute(dest)?;
        self.pending.lock().await.push(Change::Copy {
            src: src.to_string(),
            dest: dest.to_string(),
        });
        Ok(())
    }

    async fn set_property(
        &self,
        node_path: &str,
        name: &str,
        value: PropertyValue,
    ) -> RepositoryResult<()> {
        self.ensure_live()?;
        path::validate_absolute(node_path)?;
        self.pending.lock().await.push(Change::SetProperty {
            path: node_path.to_string(),
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    async fn save(&self) -> RepositoryResult<()> {
        self.ensure_live()?;
        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            return Ok(());
        }
        let batch = ChangeBatch { changes: &pending };
        let response = self
            .transport
            .send("changes.commit", CHANGES_ENDPOINT, |client, url| {
                client.post(url).json(&batch)
            })
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = body_text(response).await;
            return Err(RepositoryError::Commit {
                reason: format!("status {}: {detail}", status.as_u16()),
            });
        }
        debug!(user = %self.user_id, changes = pending.len(), "repository changes committed");
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
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }
        self.pending.lock().await.clear();
        match self
            .transport
            .send("session.logout", SESSION_ENDPOINT, |client, url| {
                client.delete(url)
            })
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(user = %self.user_id, "repository session closed");
            }
            Ok(response) => {
                warn!(
                    user = %self.user_id,
                    status = response.status().as_u16(),
                    "repository logout returned unexpected status"
                );
            }
            Err(err) => warn!(user = %self.user_id, error = %err, "repository logout failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    const ADMIN_AUTH: &str = "Basic YWRtaW46YWRtaW4=";

    async fn session(server: &MockServer) -> Result<RestSession> {
        let repository = RestRepository::new(&server.base_url(), Duration::from_secs(5))?;
        Ok(repository.login(&Credentials::new("admin", "admin")).await?)
    }

    #[tokio::test]
    async fn login_reads_user_id_and_rejects_bad_credentials() -> Result<()> {
        let server = MockServer::start_async().await;
        let ok = server.mock(|when, then| {
            when.method(GET)
                .path("/session")
                .header("authorization", ADMIN_AUTH);
            then.status(200).json_body(json!({"userId": "admin"}));
        });
        let denied = server.mock(|when, then| {
            when.method(GET)
                .path("/session")
                .header("authorization", "Basic YWRtaW46d3Jvbmc=");
            then.status(401);
        });

        let session = session(&server).await?;
        assert_eq!(session.user_id(), "admin");
        ok.assert();

        let repository = RestRepository::new(&server.base_url(), Duration::from_secs(5))?;
        let err = repository
            .login(&Credentials::new("admin", "wrong"))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("login with wrong password succeeded"))?;
        assert!(matches!(err, RepositoryError::LoginRejected { .. }));
        denied.assert();
        Ok(())
    }

    #[tokio::test]
    async fn get_node_maps_not_found() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/session");
            then.status(200).json_body(json!({"userId": "admin"}));
        });
        let found = server.mock(|when, then| {
            when.method(GET)
                .path("/nodes")
                .query_param("path", "/hippo:configuration/hippo:update/hippo:history");
            then.status(200).json_body(json!({
                "name": "hippo:history",
                "path": "/hippo:configuration/hippo:update/hippo:history",
                "primaryType": "hipposys:updaterfolder"
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/nodes")
                .query_param("path", "/hippo:configuration/hippo:update/hippo:history/a-1");
            then.status(404);
        });

        let session = session(&server).await?;
        assert!(
            session
                .node_exists("/hippo:configuration/hippo:update/hippo:history")
                .await?
        );
        assert!(
            !session
                .node_exists("/hippo:configuration/hippo:update/hippo:history/a-1")
                .await?
        );
        found.assert();
        Ok(())
    }

    #[tokio::test]
    async fn query_maps_bad_request_to_invalid_query() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/session");
            then.status(200).json_body(json!({"userId": "admin"}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/query/validate")
                .json_body(json!({"statement": "//element(*", "language": "xpath"}));
            then.status(400).body("unbalanced parenthesis");
        });

        let session = session(&server).await?;
        let err = session
            .validate_query("//element(*", QueryLanguage::Xpath)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("broken query validated"))?;
        match err {
            RepositoryError::InvalidQuery { reason, .. } => {
                assert_eq!(reason, "unbalanced parenthesis");
            }
            other => anyhow::bail!("unexpected error {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn save_posts_pending_changes_once() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/session");
            then.status(200).json_body(json!({"userId": "admin"}));
        });
        let commit = server.mock(|when, then| {
            when.method(POST).path("/changes").json_body(json!({
                "changes": [
                    {"op": "copy", "src": "/r/a", "dest": "/q/a-1"},
                    {
                        "op": "setProperty",
                        "path": "/q/a-1",
                        "name": "hipposys:dryrun",
                        "value": false
                    }
                ]
            }));
            then.status(204);
        });

        let session = session(&server).await?;
        session.copy("/r/a", "/q/a-1").await?;
        session
            .set_property("/q/a-1", "hipposys:dryrun", false.into())
            .await?;
        session.save().await?;
        session.save().await?;
        commit.assert();
        Ok(())
    }

    #[tokio::test]
    async fn logout_deletes_session_once() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/session");
            then.status(200).json_body(json!({"userId": "admin"}));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/session");
            then.status(204);
        });

        let session = session(&server).await?;
        session.logout().await;
        session.logout().await;
        assert!(!session.is_live().await);
        assert!(matches!(
            session.save().await,
            Err(RepositoryError::SessionClosed)
        ));
        delete.assert();
        Ok(())
    }

    #[test]
    fn new_rejects_unparseable_location() {
        assert!(matches!(
            RestRepository::new("not a url", Duration::from_secs(1)),
            Err(RepositoryError::InvalidLocation { .. })
        ));
    }
}
