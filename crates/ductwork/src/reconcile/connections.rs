//! Two-phase connection reconciliation.
//!
//! The instance refuses to delete or recreate a source or destination that a
//! live connection references, so connections are torn down before the
//! entity passes run and rebuilt afterwards, once final ids are known.

use std::collections::{BTreeMap, BTreeSet};

use crate::api::{ConnectionBase, ConnectionCreate, ConnectionUpdate, SyncCatalog};
use crate::diff::{diff_configs, ConfigMap, ConfigValue, DiffTree};
use crate::model::{Connection, InitializedDestination, InitializedSource, NormalizationSetting};

use super::error::{ReconcileError, Result};
use super::inventory::fetch_connections;
use super::normalization;
use super::scope::ReconcileScope;
use super::streams::merge_streams;

/// Builds the comparison record for one connection: endpoint names, the
/// normalization flag and the per-stream sync modes.
///
/// With `include_normalization` false the normalize key is left out of the
/// record, so a connection whose desired intent is unset never diffs against
/// whatever the instance settled on.
fn connection_record(connection: &Connection, include_normalization: bool) -> ConfigMap {
    let mut record = ConfigMap::new();
    record.insert(
        "source".to_string(),
        ConfigValue::from(connection.source.name.clone()),
    );
    record.insert(
        "destination".to_string(),
        ConfigValue::from(connection.destination.name.clone()),
    );
    if include_normalization {
        record.insert(
            "normalize".to_string(),
            ConfigValue::Bool(connection.normalization == NormalizationSetting::Enabled),
        );
    }
    let streams: ConfigMap = connection
        .stream_config
        .iter()
        .map(|(name, mode)| (name.clone(), ConfigValue::from(mode.to_string())))
        .collect();
    record.insert("streams".to_string(), ConfigValue::Map(streams));
    record
}

/// Diff of one connection's comparison records, nested under its name.
fn connection_diff(
    name: &str,
    desired: Option<&Connection>,
    observed: Option<&Connection>,
) -> DiffTree {
    let include_normalization = desired.map(|c| !c.normalization.is_unset()).unwrap_or(true);
    let desired_record = desired
        .map(|c| connection_record(c, include_normalization))
        .unwrap_or_default();
    let observed_record = observed
        .map(|c| connection_record(c, include_normalization))
        .unwrap_or_default();

    let inner = diff_configs(&desired_record, &observed_record);
    if inner.is_empty() {
        DiffTree::new()
    } else {
        DiffTree::new().with_child(name, inner)
    }
}

/// Pre-phase: diffs desired connections against observed ones and deletes
/// the connections that would block the coming source and destination
/// passes, namely those being dropped and those whose endpoints are about
/// to be recreated.
pub async fn reconcile_pre(
    scope: &ReconcileScope<'_>,
    desired: &BTreeMap<String, Connection>,
    observed_sources: &BTreeMap<String, InitializedSource>,
    observed_destinations: &BTreeMap<String, InitializedDestination>,
    delete_unmentioned: bool,
    dry_run: bool,
) -> Result<DiffTree> {
    let observed = fetch_connections(scope, observed_sources, observed_destinations).await?;

    let mut diff = DiffTree::new();
    let mut names: BTreeSet<&String> = desired.keys().collect();
    names.extend(observed.keys());

    for name in names {
        let configured = desired.get(name);
        let existing = observed.get(name);

        // Unmentioned remote connections are adopted, not managed.
        if configured.is_none() && !delete_unmentioned {
            log::debug!("Adopting unmanaged connection '{}'", name);
            continue;
        }

        diff = diff.join(connection_diff(
            name,
            configured,
            existing.map(|e| &e.connection),
        ));

        if let Some(existing) = existing {
            let delete = match configured {
                None => true,
                Some(configured) => configured.must_be_recreated(&existing.connection),
            };
            if delete {
                if dry_run {
                    log::info!("Would delete connection '{}'", name);
                } else {
                    log::info!("Deleting connection '{}'", name);
                    scope
                        .client()
                        .delete_connection(existing.connection_id)
                        .await?;
                }
            }
        }
    }

    Ok(diff)
}

/// Post-phase: creates or updates desired connections now that sources and
/// destinations carry their final ids.
///
/// The diff was already captured in the pre-phase; this phase only issues
/// mutations, and only for connections whose comparison records actually
/// diverge. It never runs under dry-run.
pub async fn reconcile_post(
    scope: &mut ReconcileScope<'_>,
    desired: &BTreeMap<String, Connection>,
    sources: &BTreeMap<String, InitializedSource>,
    destinations: &BTreeMap<String, InitializedDestination>,
) -> Result<()> {
    let observed = fetch_connections(scope, sources, destinations).await?;

    for (name, configured) in desired {
        let existing = observed.get(name);

        if let Some(existing) = existing {
            if connection_diff(name, Some(configured), Some(&existing.connection)).is_empty() {
                log::debug!("Connection '{}' is up to date", name);
                continue;
            }
        }

        let source =
            sources
                .get(&configured.source.name)
                .ok_or_else(|| ReconcileError::MissingEntity {
                    connection: name.clone(),
                    kind: "source",
                    name: configured.source.name.clone(),
                })?;
        let destination = destinations.get(&configured.destination.name).ok_or_else(|| {
            ReconcileError::MissingEntity {
                connection: name.clone(),
                kind: "destination",
                name: configured.destination.name.clone(),
            }
        })?;

        let operation_id = normalization::resolve(
            scope,
            existing.map(|e| e.connection_id),
            destination,
            configured.normalization,
        )
        .await?;

        let source_id = source.id.ok_or_else(|| ReconcileError::MissingRemoteId {
            kind: "source",
            name: source.entity.name.clone(),
            operation: "discover its schema",
        })?;
        let discovery = scope.discover_schema(source_id).await?;
        let streams = merge_streams(&discovery.catalog.streams, &configured.stream_config);
        let base = ConnectionBase::new(
            name.clone(),
            operation_id.into_iter().collect(),
            SyncCatalog::new(streams),
        );

        match existing {
            Some(existing) => {
                log::info!("Updating connection '{}'", name);
                scope
                    .client()
                    .update_connection(&ConnectionUpdate {
                        base,
                        connection_id: existing.connection_id,
                        source_catalog_id: discovery.catalog_id,
                    })
                    .await?;
            }
            None => {
                let destination_id =
                    destination
                        .id
                        .ok_or_else(|| ReconcileError::MissingRemoteId {
                            kind: "destination",
                            name: destination.entity.name.clone(),
                            operation: "create a connection",
                        })?;
                log::info!("Creating connection '{}'", name);
                scope
                    .client()
                    .create_connection(&ConnectionCreate {
                        base,
                        source_id,
                        destination_id,
                        source_catalog_id: discovery.catalog_id,
                    })
                    .await?;
            }
        }
    }

    Ok(())
}
