//! K8s-style resource types for declarative configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::api::InstanceConfig;
use crate::diff::ConfigMap;
use crate::model::SyncMode;

/// The API version for all ductwork resources.
pub const API_VERSION: &str = "ductwork.dev/v1";

/// The kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Instance,
    Source,
    Destination,
    Connection,
}

impl ResourceKind {
    /// Returns the directory name for storing resources of this kind.
    pub fn directory(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Instance => None, // instance.yaml at root
            ResourceKind::Source => Some("sources"),
            ResourceKind::Destination => Some("destinations"),
            ResourceKind::Connection => Some("connections"),
        }
    }

    /// Returns all resource kinds.
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Instance,
            ResourceKind::Source,
            ResourceKind::Destination,
            ResourceKind::Connection,
        ]
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Instance => write!(f, "Instance"),
            ResourceKind::Source => write!(f, "Source"),
            ResourceKind::Destination => write!(f, "Destination"),
            ResourceKind::Connection => write!(f, "Connection"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instance" => Ok(ResourceKind::Instance),
            "source" => Ok(ResourceKind::Source),
            "destination" => Ok(ResourceKind::Destination),
            "connection" => Ok(ResourceKind::Connection),
            _ => Err(format!("Unknown resource kind: {}", s)),
        }
    }
}

/// Metadata for a resource, following K8s conventions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// The unique name of the resource within its kind.
    pub name: String,

    /// Key-value labels for organizing and selecting resources.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,

    /// Key-value annotations for storing additional metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
}

impl ObjectMeta {
    /// Creates a new ObjectMeta with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::new(),
            annotations: HashMap::new(),
        }
    }
}

/// A generic K8s-style resource wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource<T> {
    /// API version, should always be `ductwork.dev/v1`.
    pub api_version: String,

    /// The kind of resource.
    pub kind: ResourceKind,

    /// Resource metadata.
    pub metadata: ObjectMeta,

    /// The resource specification.
    pub spec: T,
}

impl<T> Resource<T> {
    /// Creates a new resource with the given kind and spec.
    pub fn new(kind: ResourceKind, name: impl Into<String>, spec: T) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind,
            metadata: ObjectMeta::new(name),
            spec,
        }
    }

    /// Returns the name of the resource.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

// ============================================================================
// Instance Resource
// ============================================================================

/// Instance specification - where the data-integration instance lives and
/// how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    /// Hostname of the instance API.
    pub host: String,

    /// Port of the instance API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to use HTTPS.
    #[serde(default)]
    pub use_https: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Workspace to reconcile against. Defaults to the instance's default
    /// workspace when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Uuid>,
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl InstanceSpec {
    /// Builds the client connection settings for this instance.
    pub fn instance_config(&self) -> InstanceConfig {
        InstanceConfig {
            host: self.host.clone(),
            port: self.port,
            use_https: self.use_https,
            request_timeout: std::time::Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Type alias for Instance resource.
pub type InstanceResource = Resource<InstanceSpec>;

// ============================================================================
// Source Resource
// ============================================================================

/// Source specification - a connector that records are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    /// Connector type name, e.g. `Postgres`. Immutable once created.
    #[serde(rename = "type")]
    pub source_type: String,

    /// Connector-specific configuration.
    #[serde(default)]
    pub configuration: ConfigMap,
}

/// Type alias for Source resource.
pub type SourceResource = Resource<SourceSpec>;

// ============================================================================
// Destination Resource
// ============================================================================

/// Destination specification - a connector that records are written into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSpec {
    /// Connector type name, e.g. `Snowflake`. Immutable once created.
    #[serde(rename = "type")]
    pub destination_type: String,

    /// Connector-specific configuration.
    #[serde(default)]
    pub configuration: ConfigMap,
}

/// Type alias for Destination resource.
pub type DestinationResource = Resource<DestinationSpec>;

// ============================================================================
// Connection Resource
// ============================================================================

/// Connection specification - a sync relationship between a named source
/// and a named destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
    /// Name of the Source resource records are read from.
    pub source: String,

    /// Name of the Destination resource records are written into.
    pub destination: String,

    /// Whether basic normalization runs on this connection. Leaving it
    /// unset enables normalization only on destinations that support it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,

    /// Streams to sync, keyed by stream name.
    #[serde(default)]
    pub streams: BTreeMap<String, SyncMode>,
}

/// Type alias for Connection resource.
pub type ConnectionResource = Resource<ConnectionSpec>;

// ============================================================================
// Any Resource (for generic handling)
// ============================================================================

/// A resource that can be any of the supported types.
///
/// Constructed by the loader after inspecting the document's `kind`; `Source`
/// and `Destination` specs are structurally identical, so documents are never
/// deserialized into this enum directly.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum AnyResource {
    Instance(InstanceResource),
    Source(SourceResource),
    Destination(DestinationResource),
    Connection(ConnectionResource),
}

impl AnyResource {
    /// Returns the kind of this resource.
    pub fn kind(&self) -> ResourceKind {
        match self {
            AnyResource::Instance(_) => ResourceKind::Instance,
            AnyResource::Source(_) => ResourceKind::Source,
            AnyResource::Destination(_) => ResourceKind::Destination,
            AnyResource::Connection(_) => ResourceKind::Connection,
        }
    }

    /// Returns the name of this resource.
    pub fn name(&self) -> &str {
        match self {
            AnyResource::Instance(r) => &r.metadata.name,
            AnyResource::Source(r) => &r.metadata.name,
            AnyResource::Destination(r) => &r.metadata.name,
            AnyResource::Connection(r) => &r.metadata.name,
        }
    }
}

/// Intermediate struct for parsing resources before determining their type.
///
/// `kind` stays a plain string here so an unknown kind surfaces as its own
/// error instead of a generic YAML failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHeader {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
}

/// A resource along with its file path.
#[derive(Debug, Clone)]
pub struct ResourceWithPath<T> {
    /// The resource.
    pub resource: T,
    /// The file path relative to the config directory.
    pub path: std::path::PathBuf,
}

impl<T> ResourceWithPath<T> {
    pub fn new(resource: T, path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            resource,
            path: path.into(),
        }
    }
}
