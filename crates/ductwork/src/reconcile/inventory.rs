//! Fetching and decoding observed instance state.

use std::collections::BTreeMap;

use crate::api::{ConnectionRead, DestinationRead, SourceRead};
use crate::model::{
    Connection, Destination, InitializedConnection, InitializedDestination, InitializedSource,
    NormalizationSetting, Source, SyncMode,
};

use super::error::{ReconcileError, Result};
use super::scope::ReconcileScope;

/// Observed sources and destinations, keyed by name.
#[derive(Debug, Clone)]
pub struct RemoteInventory {
    /// Sources living on the instance.
    pub sources: BTreeMap<String, InitializedSource>,
    /// Destinations living on the instance.
    pub destinations: BTreeMap<String, InitializedDestination>,
}

impl RemoteInventory {
    /// Fetches and decodes the workspace's sources and destinations.
    pub async fn fetch(scope: &ReconcileScope<'_>) -> Result<Self> {
        let sources = scope.client().list_sources(scope.workspace_id()).await?;
        let destinations = scope
            .client()
            .list_destinations(scope.workspace_id())
            .await?;

        log::debug!(
            "Observed {} sources and {} destinations",
            sources.len(),
            destinations.len()
        );

        Ok(Self {
            sources: sources
                .into_iter()
                .map(|s| (s.name.clone(), decode_source(s)))
                .collect(),
            destinations: destinations
                .into_iter()
                .map(|d| (d.name.clone(), decode_destination(d)))
                .collect(),
        })
    }
}

/// Decodes a source read into the desired-state shape plus its ids.
pub fn decode_source(read: SourceRead) -> InitializedSource {
    InitializedSource::new(
        Source::new(read.name, read.source_name, read.connection_configuration),
        Some(read.source_id),
        Some(read.source_definition_id),
    )
}

/// Decodes a destination read into the desired-state shape plus its ids.
pub fn decode_destination(read: DestinationRead) -> InitializedDestination {
    InitializedDestination::new(
        Destination::new(
            read.name,
            read.destination_name,
            read.connection_configuration,
        ),
        Some(read.destination_id),
        Some(read.destination_definition_id),
    )
}

/// Lists the workspace's connections and decodes each against the given
/// source and destination maps.
pub async fn fetch_connections(
    scope: &ReconcileScope<'_>,
    sources: &BTreeMap<String, InitializedSource>,
    destinations: &BTreeMap<String, InitializedDestination>,
) -> Result<BTreeMap<String, InitializedConnection>> {
    let reads = scope.client().list_connections(scope.workspace_id()).await?;

    let mut connections = BTreeMap::new();
    for read in reads {
        let decoded = decode_connection(read, sources, destinations)?;
        connections.insert(decoded.connection.name.clone(), decoded);
    }
    Ok(connections)
}

/// Decodes an observed connection, resolving its endpoints by remote id.
///
/// Only selected streams are decoded; a deselected stream is not synced and
/// must not count against the desired stream table. Normalization intent is
/// read off the operation attachment: a connection with operations runs
/// normalization, one without does not.
pub fn decode_connection(
    read: ConnectionRead,
    sources: &BTreeMap<String, InitializedSource>,
    destinations: &BTreeMap<String, InitializedDestination>,
) -> Result<InitializedConnection> {
    let source = sources
        .values()
        .find(|s| s.id == Some(read.source_id))
        .map(|s| s.entity.clone())
        .ok_or_else(|| ReconcileError::UndecodableReference {
            connection: read.name.clone(),
            kind: "source",
            id: read.source_id,
        })?;

    let destination = destinations
        .values()
        .find(|d| d.id == Some(read.destination_id))
        .map(|d| d.entity.clone())
        .ok_or_else(|| ReconcileError::UndecodableReference {
            connection: read.name.clone(),
            kind: "destination",
            id: read.destination_id,
        })?;

    let mut stream_config = BTreeMap::new();
    for entry in &read.sync_catalog.streams {
        if !entry.config.selected {
            continue;
        }
        let mode = SyncMode::from_wire(&entry.config.sync_mode, &entry.config.destination_sync_mode)
            .ok_or_else(|| ReconcileError::UnknownSyncModes {
                connection: read.name.clone(),
                stream: entry.stream.name.clone(),
                sync_mode: entry.config.sync_mode.clone(),
                destination_sync_mode: entry.config.destination_sync_mode.clone(),
            })?;
        stream_config.insert(entry.stream.name.clone(), mode);
    }

    let normalization = if read.operation_ids.is_empty() {
        NormalizationSetting::Disabled
    } else {
        NormalizationSetting::Enabled
    };

    Ok(InitializedConnection {
        connection: Connection::new(read.name, source, destination, stream_config, normalization),
        connection_id: read.connection_id,
    })
}
