//! Wire types for the instance configuration API.
//!
//! All payloads are JSON with camelCase keys. Entity configurations stay
//! opaque maps so connector-specific settings pass through untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::ConfigMap;

// ============================================================================
// Read types
// ============================================================================

/// A workspace on the instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRead {
    /// Workspace identifier.
    pub workspace_id: Uuid,

    /// Workspace display name.
    #[serde(default)]
    pub name: String,
}

/// A connector definition known to the instance.
///
/// Sources and destinations use different wire field names for the
/// definition id, so the client maps both onto this record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRead {
    /// Definition identifier.
    pub id: Uuid,
    /// Connector type name, e.g. `Postgres`.
    pub name: String,
}

/// A source as the instance reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRead {
    /// Source identifier.
    pub source_id: Uuid,

    /// User-assigned source name.
    pub name: String,

    /// Connector type name.
    pub source_name: String,

    /// Definition this source was created from.
    pub source_definition_id: Uuid,

    /// Connector-specific configuration.
    #[serde(default)]
    pub connection_configuration: ConfigMap,
}

/// A destination as the instance reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRead {
    /// Destination identifier.
    pub destination_id: Uuid,

    /// User-assigned destination name.
    pub name: String,

    /// Connector type name.
    pub destination_name: String,

    /// Definition this destination was created from.
    pub destination_definition_id: Uuid,

    /// Connector-specific configuration.
    #[serde(default)]
    pub connection_configuration: ConfigMap,
}

/// A connection as the instance reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRead {
    /// Connection identifier.
    pub connection_id: Uuid,

    /// User-assigned connection name.
    pub name: String,

    /// Source endpoint.
    pub source_id: Uuid,

    /// Destination endpoint.
    pub destination_id: Uuid,

    /// Streams this connection syncs.
    pub sync_catalog: SyncCatalog,

    /// Attached operations, e.g. basic normalization.
    #[serde(default)]
    pub operation_ids: Vec<Uuid>,
}

/// An operation attached to a connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRead {
    /// Operation identifier.
    pub operation_id: Uuid,

    /// Operation display name.
    pub name: String,

    /// What the operation does.
    #[serde(default)]
    pub operator_configuration: OperatorConfiguration,
}

impl OperationRead {
    /// Whether this operation runs basic normalization.
    pub fn is_basic_normalization(&self) -> bool {
        self.operator_configuration.operator_type == "normalization"
            && self
                .operator_configuration
                .normalization
                .as_ref()
                .is_some_and(|n| n.option == "basic")
    }
}

/// Result of schema discovery against a live source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiscovery {
    /// The discovered stream catalog.
    pub catalog: SyncCatalog,

    /// Identifier of the stored catalog snapshot.
    pub catalog_id: Uuid,
}

// ============================================================================
// Catalog types
// ============================================================================

/// A stream catalog: what a connection could or does sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncCatalog {
    /// Streams with their per-stream settings.
    pub streams: Vec<CatalogStream>,
}

impl SyncCatalog {
    /// Creates a catalog from stream entries.
    pub fn new(streams: Vec<CatalogStream>) -> Self {
        Self { streams }
    }
}

/// One stream entry in a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// The stream itself, as the source connector describes it.
    pub stream: StreamDescriptor,

    /// Sync settings for this stream.
    pub config: StreamSettings,
}

/// A stream as described by the source connector.
///
/// Only the name is interpreted; schema and other connector-provided fields
/// round-trip through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream name.
    pub name: String,

    /// Remaining connector-provided fields, e.g. `jsonSchema`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StreamDescriptor {
    /// Creates a descriptor carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Per-stream sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    /// How records are read from the source.
    pub sync_mode: String,

    /// How records are written to the destination.
    pub destination_sync_mode: String,

    /// Whether the stream participates in syncs.
    #[serde(default)]
    pub selected: bool,

    /// Remaining settings, e.g. `cursorField`, round-tripped untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Request types
// ============================================================================

/// Request body for creating a source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCreate {
    /// Workspace to create the source in.
    pub workspace_id: Uuid,

    /// Definition to instantiate.
    pub source_definition_id: Uuid,

    /// User-assigned name.
    pub name: String,

    /// Connector-specific configuration.
    pub connection_configuration: ConfigMap,
}

/// Request body for updating a source in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUpdate {
    /// Source to update.
    pub source_id: Uuid,

    /// User-assigned name.
    pub name: String,

    /// Connector-specific configuration.
    pub connection_configuration: ConfigMap,
}

/// Request body for creating a destination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationCreate {
    /// Workspace to create the destination in.
    pub workspace_id: Uuid,

    /// Definition to instantiate.
    pub destination_definition_id: Uuid,

    /// User-assigned name.
    pub name: String,

    /// Connector-specific configuration.
    pub connection_configuration: ConfigMap,
}

/// Request body for updating a destination in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationUpdate {
    /// Destination to update.
    pub destination_id: Uuid,

    /// User-assigned name.
    pub name: String,

    /// Connector-specific configuration.
    pub connection_configuration: ConfigMap,
}

/// Fields shared by connection create and update bodies.
///
/// Namespace handling, scheduling and status are fixed: connections mirror
/// the source namespace, run on manual schedules and start active.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionBase {
    /// User-assigned connection name.
    pub name: String,

    /// Namespace strategy for written records.
    pub namespace_definition: String,

    /// Namespace format template.
    pub namespace_format: String,

    /// Prefix applied to destination stream names.
    pub prefix: String,

    /// Operations to attach, e.g. a normalization operation.
    pub operation_ids: Vec<Uuid>,

    /// Streams to sync.
    pub sync_catalog: SyncCatalog,

    /// Scheduling strategy.
    pub schedule_type: String,

    /// Connection status.
    pub status: String,
}

impl ConnectionBase {
    /// Builds the shared body with the fixed namespace/schedule settings.
    pub fn new(name: impl Into<String>, operation_ids: Vec<Uuid>, sync_catalog: SyncCatalog) -> Self {
        Self {
            name: name.into(),
            namespace_definition: "source".to_string(),
            namespace_format: "${SOURCE_NAMESPACE}".to_string(),
            prefix: String::new(),
            operation_ids,
            sync_catalog,
            schedule_type: "manual".to_string(),
            status: "active".to_string(),
        }
    }
}

/// Request body for creating a connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCreate {
    /// Shared connection fields.
    #[serde(flatten)]
    pub base: ConnectionBase,

    /// Source endpoint.
    pub source_id: Uuid,

    /// Destination endpoint.
    pub destination_id: Uuid,

    /// Discovered catalog snapshot the sync catalog was built from.
    pub source_catalog_id: Uuid,
}

/// Request body for updating a connection in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    /// Shared connection fields.
    #[serde(flatten)]
    pub base: ConnectionBase,

    /// Connection to update.
    pub connection_id: Uuid,

    /// Discovered catalog snapshot the sync catalog was built from.
    pub source_catalog_id: Uuid,
}

/// Request body for creating an operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationCreate {
    /// Workspace to create the operation in.
    pub workspace_id: Uuid,

    /// Operation display name.
    pub name: String,

    /// What the operation does.
    pub operator_configuration: OperatorConfiguration,
}

impl OperationCreate {
    /// The basic-normalization operation body.
    pub fn basic_normalization(workspace_id: Uuid) -> Self {
        Self {
            workspace_id,
            name: "Normalization".to_string(),
            operator_configuration: OperatorConfiguration {
                operator_type: "normalization".to_string(),
                normalization: Some(NormalizationOperator {
                    option: "basic".to_string(),
                }),
            },
        }
    }
}

/// Operator payload inside an operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfiguration {
    /// Operator kind discriminator.
    #[serde(default)]
    pub operator_type: String,

    /// Normalization settings, present for normalization operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<NormalizationOperator>,
}

/// Normalization operator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationOperator {
    /// Normalization flavor.
    pub option: String,
}
