//! Per-pass lookup memoization.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::api::{InstanceClient, SchemaDiscovery};

use super::error::{ReconcileError, Result};

/// Request-scoped lookup cache for one reconciliation pass.
///
/// A pass repeats the same read-only lookups many times: definition ids by
/// connector type, normalization support per definition, schema discovery
/// per source. The scope fetches each of these once and answers the rest
/// from memory. It is constructed when a pass starts and dropped when the
/// pass returns; nothing is cached across passes.
pub struct ReconcileScope<'a> {
    client: &'a dyn InstanceClient,
    workspace_id: Uuid,
    source_definitions: Option<Vec<(Uuid, String)>>,
    destination_definitions: Option<Vec<(Uuid, String)>>,
    normalization_support: BTreeMap<Uuid, bool>,
    discovered_schemas: BTreeMap<Uuid, SchemaDiscovery>,
}

impl<'a> ReconcileScope<'a> {
    /// Creates a scope for one pass against one workspace.
    pub fn new(client: &'a dyn InstanceClient, workspace_id: Uuid) -> Self {
        Self {
            client,
            workspace_id,
            source_definitions: None,
            destination_definitions: None,
            normalization_support: BTreeMap::new(),
            discovered_schemas: BTreeMap::new(),
        }
    }

    /// Returns the client this pass talks through.
    pub fn client(&self) -> &'a dyn InstanceClient {
        self.client
    }

    /// Returns the workspace this pass reconciles against.
    pub fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    /// Resolves a source connector type name to its definition id.
    ///
    /// Matching is case-insensitive. An unknown type is fatal.
    pub async fn source_definition_id(&mut self, type_name: &str) -> Result<Uuid> {
        if self.source_definitions.is_none() {
            let definitions = self.client.list_source_definitions().await?;
            self.source_definitions =
                Some(definitions.into_iter().map(|d| (d.id, d.name)).collect());
        }

        let definitions = self.source_definitions.as_deref().unwrap_or_default();
        definitions
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(type_name))
            .map(|(id, _)| *id)
            .ok_or_else(|| ReconcileError::UnknownConnectorType {
                kind: "source",
                type_name: type_name.to_string(),
            })
    }

    /// Resolves a destination connector type name to its definition id.
    ///
    /// Matching is case-insensitive. An unknown type is fatal.
    pub async fn destination_definition_id(&mut self, type_name: &str) -> Result<Uuid> {
        if self.destination_definitions.is_none() {
            let definitions = self.client.list_destination_definitions().await?;
            self.destination_definitions =
                Some(definitions.into_iter().map(|d| (d.id, d.name)).collect());
        }

        let definitions = self.destination_definitions.as_deref().unwrap_or_default();
        definitions
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(type_name))
            .map(|(id, _)| *id)
            .ok_or_else(|| ReconcileError::UnknownConnectorType {
                kind: "destination",
                type_name: type_name.to_string(),
            })
    }

    /// Returns whether a destination definition supports basic normalization.
    pub async fn destination_supports_normalization(
        &mut self,
        definition_id: Uuid,
    ) -> Result<bool> {
        if let Some(supported) = self.normalization_support.get(&definition_id) {
            return Ok(*supported);
        }

        let supported = self
            .client
            .destination_supports_normalization(definition_id, self.workspace_id)
            .await?;
        self.normalization_support.insert(definition_id, supported);
        Ok(supported)
    }

    /// Runs schema discovery for a source, at most once per pass.
    pub async fn discover_schema(&mut self, source_id: Uuid) -> Result<SchemaDiscovery> {
        if let Some(schema) = self.discovered_schemas.get(&source_id) {
            return Ok(schema.clone());
        }

        log::debug!("Discovering schema for source {}", source_id);
        let schema = self.client.discover_source_schema(source_id).await?;
        self.discovered_schemas.insert(source_id, schema.clone());
        Ok(schema)
    }
}
