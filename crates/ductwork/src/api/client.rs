//! HTTP client for the instance configuration API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, Result};
use super::types::{
    ConnectionCreate, ConnectionRead, ConnectionUpdate, DefinitionRead, DestinationCreate,
    DestinationRead, DestinationUpdate, OperationCreate, OperationRead, SchemaDiscovery,
    SourceCreate, SourceRead, SourceUpdate, WorkspaceRead,
};

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of retries for transient errors.
const MAX_RETRIES: u32 = 3;
/// Base delay for exponential backoff (in milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Maximum length for error bodies carried into error values.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates an error response body to a reasonable length.
fn truncate_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// Connection settings for an instance API.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Hostname of the instance API.
    pub host: String,
    /// Port of the instance API.
    pub port: u16,
    /// Whether to use HTTPS.
    pub use_https: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl InstanceConfig {
    /// Returns the API root URL for this instance.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}:{}/api/v1", scheme, self.host, self.port)
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            use_https: false,
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Operations the reconciliation engine needs from an instance.
///
/// The engine only depends on this trait; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait InstanceClient: Send + Sync {
    /// Returns the instance's default workspace.
    async fn default_workspace(&self) -> Result<WorkspaceRead>;

    /// Lists all source connector definitions.
    async fn list_source_definitions(&self) -> Result<Vec<DefinitionRead>>;

    /// Lists all destination connector definitions.
    async fn list_destination_definitions(&self) -> Result<Vec<DefinitionRead>>;

    /// Returns whether a destination definition supports basic normalization.
    async fn destination_supports_normalization(
        &self,
        definition_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<bool>;

    /// Lists sources in a workspace.
    async fn list_sources(&self, workspace_id: Uuid) -> Result<Vec<SourceRead>>;

    /// Creates a source.
    async fn create_source(&self, request: &SourceCreate) -> Result<SourceRead>;

    /// Updates a source's name and configuration in place.
    async fn update_source(&self, request: &SourceUpdate) -> Result<SourceRead>;

    /// Deletes a source.
    async fn delete_source(&self, source_id: Uuid) -> Result<()>;

    /// Lists destinations in a workspace.
    async fn list_destinations(&self, workspace_id: Uuid) -> Result<Vec<DestinationRead>>;

    /// Creates a destination.
    async fn create_destination(&self, request: &DestinationCreate) -> Result<DestinationRead>;

    /// Updates a destination's name and configuration in place.
    async fn update_destination(&self, request: &DestinationUpdate) -> Result<DestinationRead>;

    /// Deletes a destination.
    async fn delete_destination(&self, destination_id: Uuid) -> Result<()>;

    /// Lists connections in a workspace.
    async fn list_connections(&self, workspace_id: Uuid) -> Result<Vec<ConnectionRead>>;

    /// Creates a connection.
    async fn create_connection(&self, request: &ConnectionCreate) -> Result<ConnectionRead>;

    /// Updates a connection in place.
    async fn update_connection(&self, request: &ConnectionUpdate) -> Result<ConnectionRead>;

    /// Deletes a connection.
    async fn delete_connection(&self, connection_id: Uuid) -> Result<()>;

    /// Runs schema discovery against a live source.
    async fn discover_source_schema(&self, source_id: Uuid) -> Result<SchemaDiscovery>;

    /// Lists operations attached to a connection.
    async fn list_operations(&self, connection_id: Uuid) -> Result<Vec<OperationRead>>;

    /// Creates an operation.
    async fn create_operation(&self, request: &OperationCreate) -> Result<OperationRead>;
}

/// `InstanceClient` over HTTP.
///
/// Every API call is a POST with a JSON body. Transient failures are retried
/// with exponential backoff.
pub struct HttpInstanceClient {
    client: Client,
    base_url: String,
}

impl HttpInstanceClient {
    /// Creates a client for the given instance.
    pub fn new(config: &InstanceConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    /// Returns the API root URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs to an endpoint, retrying transient errors.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self.post_raw(path, body).await?;
        serde_json::from_str(&response).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// POSTs to an endpoint that answers with no meaningful body.
    async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync,
    {
        self.post_raw(path, body).await?;
        Ok(())
    }

    /// POSTs to an endpoint and returns the raw response body,
    /// retrying transient errors with exponential backoff.
    async fn post_raw<B>(&self, path: &str, body: &B) -> Result<String>
    where
        B: Serialize + Sync,
    {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1)); // 500ms, 1s, 2s
                log::info!(
                    "Retrying {} (attempt {}/{}) after {}ms...",
                    path,
                    attempt + 1,
                    MAX_RETRIES + 1,
                    delay
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.post_once(path, body).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if e.is_retryable() && attempt < MAX_RETRIES {
                        log::warn!("Request to {} failed with retryable error: {}", path, e);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Transport {
            path: path.to_string(),
            message: "request failed after all retries".to_string(),
        }))
    }

    /// Single POST attempt.
    async fn post_once<B>(&self, path: &str, body: &B) -> Result<String>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        response.text().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// Wire envelopes
// ============================================================================

#[derive(Deserialize)]
struct WorkspaceList {
    workspaces: Vec<WorkspaceRead>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceDefinitionList {
    source_definitions: Vec<SourceDefinitionWire>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceDefinitionWire {
    source_definition_id: Uuid,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DestinationDefinitionList {
    destination_definitions: Vec<DestinationDefinitionWire>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DestinationDefinitionWire {
    destination_definition_id: Uuid,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizationSupport {
    #[serde(default)]
    supports_normalization: bool,
}

#[derive(Deserialize)]
struct SourceList {
    sources: Vec<SourceRead>,
}

#[derive(Deserialize)]
struct DestinationList {
    destinations: Vec<DestinationRead>,
}

#[derive(Deserialize)]
struct ConnectionList {
    connections: Vec<ConnectionRead>,
}

#[derive(Deserialize)]
struct OperationList {
    operations: Vec<OperationRead>,
}

#[async_trait]
impl InstanceClient for HttpInstanceClient {
    async fn default_workspace(&self) -> Result<WorkspaceRead> {
        let list: WorkspaceList = self.post("/workspaces/list", &serde_json::json!({})).await?;
        list.workspaces.into_iter().next().ok_or(ApiError::NoWorkspace)
    }

    async fn list_source_definitions(&self) -> Result<Vec<DefinitionRead>> {
        let list: SourceDefinitionList = self
            .post("/source_definitions/list", &serde_json::json!({}))
            .await?;
        Ok(list
            .source_definitions
            .into_iter()
            .map(|d| DefinitionRead {
                id: d.source_definition_id,
                name: d.name,
            })
            .collect())
    }

    async fn list_destination_definitions(&self) -> Result<Vec<DefinitionRead>> {
        let list: DestinationDefinitionList = self
            .post("/destination_definitions/list", &serde_json::json!({}))
            .await?;
        Ok(list
            .destination_definitions
            .into_iter()
            .map(|d| DefinitionRead {
                id: d.destination_definition_id,
                name: d.name,
            })
            .collect())
    }

    async fn destination_supports_normalization(
        &self,
        definition_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<bool> {
        let spec: NormalizationSupport = self
            .post(
                "/destination_definition_specifications/get",
                &serde_json::json!({
                    "destinationDefinitionId": definition_id,
                    "workspaceId": workspace_id,
                }),
            )
            .await?;
        Ok(spec.supports_normalization)
    }

    async fn list_sources(&self, workspace_id: Uuid) -> Result<Vec<SourceRead>> {
        let list: SourceList = self
            .post("/sources/list", &serde_json::json!({"workspaceId": workspace_id}))
            .await?;
        Ok(list.sources)
    }

    async fn create_source(&self, request: &SourceCreate) -> Result<SourceRead> {
        self.post("/sources/create", request).await
    }

    async fn update_source(&self, request: &SourceUpdate) -> Result<SourceRead> {
        self.post("/sources/update", request).await
    }

    async fn delete_source(&self, source_id: Uuid) -> Result<()> {
        self.post_no_content("/sources/delete", &serde_json::json!({"sourceId": source_id}))
            .await
    }

    async fn list_destinations(&self, workspace_id: Uuid) -> Result<Vec<DestinationRead>> {
        let list: DestinationList = self
            .post(
                "/destinations/list",
                &serde_json::json!({"workspaceId": workspace_id}),
            )
            .await?;
        Ok(list.destinations)
    }

    async fn create_destination(&self, request: &DestinationCreate) -> Result<DestinationRead> {
        self.post("/destinations/create", request).await
    }

    async fn update_destination(&self, request: &DestinationUpdate) -> Result<DestinationRead> {
        self.post("/destinations/update", request).await
    }

    async fn delete_destination(&self, destination_id: Uuid) -> Result<()> {
        self.post_no_content(
            "/destinations/delete",
            &serde_json::json!({"destinationId": destination_id}),
        )
        .await
    }

    async fn list_connections(&self, workspace_id: Uuid) -> Result<Vec<ConnectionRead>> {
        let list: ConnectionList = self
            .post(
                "/connections/list",
                &serde_json::json!({"workspaceId": workspace_id}),
            )
            .await?;
        Ok(list.connections)
    }

    async fn create_connection(&self, request: &ConnectionCreate) -> Result<ConnectionRead> {
        self.post("/connections/create", request).await
    }

    async fn update_connection(&self, request: &ConnectionUpdate) -> Result<ConnectionRead> {
        self.post("/connections/update", request).await
    }

    async fn delete_connection(&self, connection_id: Uuid) -> Result<()> {
        self.post_no_content(
            "/connections/delete",
            &serde_json::json!({"connectionId": connection_id}),
        )
        .await
    }

    async fn discover_source_schema(&self, source_id: Uuid) -> Result<SchemaDiscovery> {
        self.post(
            "/sources/discover_schema",
            &serde_json::json!({"sourceId": source_id}),
        )
        .await
    }

    async fn list_operations(&self, connection_id: Uuid) -> Result<Vec<OperationRead>> {
        let list: OperationList = self
            .post(
                "/operations/list",
                &serde_json::json!({"connectionId": connection_id}),
            )
            .await?;
        Ok(list.operations)
    }

    async fn create_operation(&self, request: &OperationCreate) -> Result<OperationRead> {
        self.post("/operations/create", request).await
    }
}
