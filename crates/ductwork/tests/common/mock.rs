//! In-memory instance API for reconciliation tests.
//!
//! `MockInstance` implements [`InstanceClient`] against plain vectors and
//! records every API call in order, so tests can assert both final state
//! and the sequence of mutations. Like the real instance, it rejects
//! deleting a source or destination that a live connection references.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ductwork::api::{
    ApiError, CatalogStream, ConnectionCreate, ConnectionRead, ConnectionUpdate, DefinitionRead,
    DestinationCreate, DestinationRead, DestinationUpdate, InstanceClient, NormalizationOperator,
    OperationCreate, OperationRead, OperatorConfiguration, Result, SchemaDiscovery, SourceCreate,
    SourceRead, SourceUpdate, StreamDescriptor, StreamSettings, SyncCatalog, WorkspaceRead,
};
use ductwork::{ConfigMap, SyncMode};
use uuid::Uuid;

struct Inner {
    workspace_id: Uuid,
    source_definitions: Vec<DefinitionRead>,
    destination_definitions: Vec<DefinitionRead>,
    normalization_support: BTreeMap<Uuid, bool>,
    sources: Vec<SourceRead>,
    destinations: Vec<DestinationRead>,
    connections: Vec<ConnectionRead>,
    operations: BTreeMap<Uuid, OperationRead>,
    catalog_ids: BTreeMap<Uuid, Uuid>,
    discovered_streams: Vec<String>,
    next_id: u128,
    calls: Vec<String>,
}

impl Inner {
    fn fresh_id(&mut self) -> Uuid {
        let id = Uuid::from_u128(self.next_id);
        self.next_id += 1;
        id
    }
}

/// An in-memory instance seeded with two source connector types
/// (`postgres`, `mysql`) and two destination connector types: `s3`, which
/// supports normalization, and `redshift`, which does not.
pub struct MockInstance {
    inner: Mutex<Inner>,
}

impl MockInstance {
    pub fn new() -> Self {
        let postgres = DefinitionRead {
            id: Uuid::from_u128(11),
            name: "postgres".to_string(),
        };
        let mysql = DefinitionRead {
            id: Uuid::from_u128(12),
            name: "mysql".to_string(),
        };
        let s3 = DefinitionRead {
            id: Uuid::from_u128(21),
            name: "s3".to_string(),
        };
        let redshift = DefinitionRead {
            id: Uuid::from_u128(22),
            name: "redshift".to_string(),
        };

        let mut normalization_support = BTreeMap::new();
        normalization_support.insert(s3.id, true);
        normalization_support.insert(redshift.id, false);

        Self {
            inner: Mutex::new(Inner {
                workspace_id: Uuid::from_u128(1),
                source_definitions: vec![postgres, mysql],
                destination_definitions: vec![s3, redshift],
                normalization_support,
                sources: Vec::new(),
                destinations: Vec::new(),
                connections: Vec::new(),
                operations: BTreeMap::new(),
                catalog_ids: BTreeMap::new(),
                discovered_streams: vec!["users".to_string()],
                next_id: 1000,
                calls: Vec::new(),
            }),
        }
    }

    /// Sets the stream names schema discovery reports for every source.
    pub fn with_discovered_streams(self, streams: &[&str]) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.discovered_streams = streams.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    // ========================================================================
    // Seeding (does not appear in the call log)
    // ========================================================================

    pub fn seed_source(&self, name: &str, source_type: &str, configuration: ConfigMap) -> Uuid {
        let mut inner = self.inner.lock().unwrap();
        let definition = inner
            .source_definitions
            .iter()
            .find(|d| d.name == source_type)
            .expect("seed_source: unknown source type")
            .clone();
        let id = inner.fresh_id();
        inner.sources.push(SourceRead {
            source_id: id,
            name: name.to_string(),
            source_name: definition.name,
            source_definition_id: definition.id,
            connection_configuration: configuration,
        });
        id
    }

    pub fn seed_destination(
        &self,
        name: &str,
        destination_type: &str,
        configuration: ConfigMap,
    ) -> Uuid {
        let mut inner = self.inner.lock().unwrap();
        let definition = inner
            .destination_definitions
            .iter()
            .find(|d| d.name == destination_type)
            .expect("seed_destination: unknown destination type")
            .clone();
        let id = inner.fresh_id();
        inner.destinations.push(DestinationRead {
            destination_id: id,
            name: name.to_string(),
            destination_name: definition.name,
            destination_definition_id: definition.id,
            connection_configuration: configuration,
        });
        id
    }

    pub fn seed_connection(
        &self,
        name: &str,
        source_id: Uuid,
        destination_id: Uuid,
        streams: &[(&str, SyncMode)],
        normalized: bool,
    ) -> Uuid {
        let mut inner = self.inner.lock().unwrap();

        let catalog_streams = streams
            .iter()
            .map(|(stream_name, mode)| CatalogStream {
                stream: StreamDescriptor::named(*stream_name),
                config: StreamSettings {
                    sync_mode: mode.sync_mode().to_string(),
                    destination_sync_mode: mode.destination_sync_mode().to_string(),
                    selected: true,
                    extra: serde_json::Map::new(),
                },
            })
            .collect();

        let operation_ids = if normalized {
            let operation_id = inner.fresh_id();
            inner.operations.insert(
                operation_id,
                OperationRead {
                    operation_id,
                    name: "Normalization".to_string(),
                    operator_configuration: OperatorConfiguration {
                        operator_type: "normalization".to_string(),
                        normalization: Some(NormalizationOperator {
                            option: "basic".to_string(),
                        }),
                    },
                },
            );
            vec![operation_id]
        } else {
            Vec::new()
        };

        let id = inner.fresh_id();
        inner.connections.push(ConnectionRead {
            connection_id: id,
            name: name.to_string(),
            source_id,
            destination_id,
            sync_catalog: SyncCatalog::new(catalog_streams),
            operation_ids,
        });
        id
    }

    // ========================================================================
    // Assertions
    // ========================================================================

    pub fn workspace_id(&self) -> Uuid {
        self.inner.lock().unwrap().workspace_id
    }

    /// Every API call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// The create/update/delete calls made so far, in order.
    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| {
                call.ends_with("/create") || call.ends_with("/update") || call.ends_with("/delete")
            })
            .collect()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|c| *c == endpoint).count()
    }

    /// Index of the first occurrence of `endpoint` in the call log.
    pub fn call_index(&self, endpoint: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == endpoint)
    }

    pub fn sources(&self) -> Vec<SourceRead> {
        self.inner.lock().unwrap().sources.clone()
    }

    pub fn destinations(&self) -> Vec<DestinationRead> {
        self.inner.lock().unwrap().destinations.clone()
    }

    pub fn connections(&self) -> Vec<ConnectionRead> {
        self.inner.lock().unwrap().connections.clone()
    }

    pub fn source_named(&self, name: &str) -> Option<SourceRead> {
        self.sources().into_iter().find(|s| s.name == name)
    }

    pub fn connection_named(&self, name: &str) -> Option<ConnectionRead> {
        self.connections().into_iter().find(|c| c.name == name)
    }
}

impl Default for MockInstance {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstanceClient for MockInstance {
    async fn default_workspace(&self) -> Result<WorkspaceRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("workspaces/list".to_string());
        Ok(WorkspaceRead {
            workspace_id: inner.workspace_id,
            name: "default".to_string(),
        })
    }

    async fn list_source_definitions(&self) -> Result<Vec<DefinitionRead>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("source_definitions/list".to_string());
        Ok(inner.source_definitions.clone())
    }

    async fn list_destination_definitions(&self) -> Result<Vec<DefinitionRead>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("destination_definitions/list".to_string());
        Ok(inner.destination_definitions.clone())
    }

    async fn destination_supports_normalization(
        &self,
        definition_id: Uuid,
        _workspace_id: Uuid,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push("destination_definition_specifications/get".to_string());
        Ok(*inner
            .normalization_support
            .get(&definition_id)
            .unwrap_or(&false))
    }

    async fn list_sources(&self, _workspace_id: Uuid) -> Result<Vec<SourceRead>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("sources/list".to_string());
        Ok(inner.sources.clone())
    }

    async fn create_source(&self, request: &SourceCreate) -> Result<SourceRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("sources/create".to_string());
        let source_name = inner
            .source_definitions
            .iter()
            .find(|d| d.id == request.source_definition_id)
            .expect("create_source: unknown definition id")
            .name
            .clone();
        let read = SourceRead {
            source_id: inner.fresh_id(),
            name: request.name.clone(),
            source_name,
            source_definition_id: request.source_definition_id,
            connection_configuration: request.connection_configuration.clone(),
        };
        inner.sources.push(read.clone());
        Ok(read)
    }

    async fn update_source(&self, request: &SourceUpdate) -> Result<SourceRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("sources/update".to_string());
        let source = inner
            .sources
            .iter_mut()
            .find(|s| s.source_id == request.source_id)
            .expect("update_source: not found");
        source.name = request.name.clone();
        source.connection_configuration = request.connection_configuration.clone();
        Ok(source.clone())
    }

    async fn delete_source(&self, source_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("sources/delete".to_string());
        if inner.connections.iter().any(|c| c.source_id == source_id) {
            return Err(ApiError::Status {
                path: "/sources/delete".to_string(),
                status: 409,
                body: "source is referenced by an active connection".to_string(),
            });
        }
        inner.sources.retain(|s| s.source_id != source_id);
        Ok(())
    }

    async fn list_destinations(&self, _workspace_id: Uuid) -> Result<Vec<DestinationRead>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("destinations/list".to_string());
        Ok(inner.destinations.clone())
    }

    async fn create_destination(&self, request: &DestinationCreate) -> Result<DestinationRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("destinations/create".to_string());
        let destination_name = inner
            .destination_definitions
            .iter()
            .find(|d| d.id == request.destination_definition_id)
            .expect("create_destination: unknown definition id")
            .name
            .clone();
        let read = DestinationRead {
            destination_id: inner.fresh_id(),
            name: request.name.clone(),
            destination_name,
            destination_definition_id: request.destination_definition_id,
            connection_configuration: request.connection_configuration.clone(),
        };
        inner.destinations.push(read.clone());
        Ok(read)
    }

    async fn update_destination(&self, request: &DestinationUpdate) -> Result<DestinationRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("destinations/update".to_string());
        let destination = inner
            .destinations
            .iter_mut()
            .find(|d| d.destination_id == request.destination_id)
            .expect("update_destination: not found");
        destination.name = request.name.clone();
        destination.connection_configuration = request.connection_configuration.clone();
        Ok(destination.clone())
    }

    async fn delete_destination(&self, destination_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("destinations/delete".to_string());
        if inner
            .connections
            .iter()
            .any(|c| c.destination_id == destination_id)
        {
            return Err(ApiError::Status {
                path: "/destinations/delete".to_string(),
                status: 409,
                body: "destination is referenced by an active connection".to_string(),
            });
        }
        inner
            .destinations
            .retain(|d| d.destination_id != destination_id);
        Ok(())
    }

    async fn list_connections(&self, _workspace_id: Uuid) -> Result<Vec<ConnectionRead>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("connections/list".to_string());
        Ok(inner.connections.clone())
    }

    async fn create_connection(&self, request: &ConnectionCreate) -> Result<ConnectionRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("connections/create".to_string());
        let read = ConnectionRead {
            connection_id: inner.fresh_id(),
            name: request.base.name.clone(),
            source_id: request.source_id,
            destination_id: request.destination_id,
            sync_catalog: request.base.sync_catalog.clone(),
            operation_ids: request.base.operation_ids.clone(),
        };
        inner.connections.push(read.clone());
        Ok(read)
    }

    async fn update_connection(&self, request: &ConnectionUpdate) -> Result<ConnectionRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("connections/update".to_string());
        let connection = inner
            .connections
            .iter_mut()
            .find(|c| c.connection_id == request.connection_id)
            .expect("update_connection: not found");
        connection.name = request.base.name.clone();
        connection.sync_catalog = request.base.sync_catalog.clone();
        connection.operation_ids = request.base.operation_ids.clone();
        Ok(connection.clone())
    }

    async fn delete_connection(&self, connection_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("connections/delete".to_string());
        inner.connections.retain(|c| c.connection_id != connection_id);
        Ok(())
    }

    async fn discover_source_schema(&self, source_id: Uuid) -> Result<SchemaDiscovery> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("sources/discover_schema".to_string());
        if !inner.catalog_ids.contains_key(&source_id) {
            let id = inner.fresh_id();
            inner.catalog_ids.insert(source_id, id);
        }
        let catalog_id = inner.catalog_ids[&source_id];
        let streams = inner
            .discovered_streams
            .iter()
            .map(|name| {
                let mut stream = StreamDescriptor::named(name);
                stream.extra.insert(
                    "jsonSchema".to_string(),
                    serde_json::json!({"type": "object"}),
                );
                CatalogStream {
                    stream,
                    config: StreamSettings {
                        sync_mode: "full_refresh".to_string(),
                        destination_sync_mode: "overwrite".to_string(),
                        selected: false,
                        extra: serde_json::Map::new(),
                    },
                }
            })
            .collect();
        Ok(SchemaDiscovery {
            catalog: SyncCatalog::new(streams),
            catalog_id,
        })
    }

    async fn list_operations(&self, connection_id: Uuid) -> Result<Vec<OperationRead>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("operations/list".to_string());
        let ids = inner
            .connections
            .iter()
            .find(|c| c.connection_id == connection_id)
            .map(|c| c.operation_ids.clone())
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| inner.operations.get(id).cloned())
            .collect())
    }

    async fn create_operation(&self, request: &OperationCreate) -> Result<OperationRead> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("operations/create".to_string());
        let read = OperationRead {
            operation_id: inner.fresh_id(),
            name: request.name.clone(),
            operator_configuration: request.operator_configuration.clone(),
        };
        inner.operations.insert(read.operation_id, read.clone());
        Ok(read)
    }
}
