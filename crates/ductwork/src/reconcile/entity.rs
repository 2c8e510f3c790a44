//! Shared reconciliation loop for sources and destinations.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::{DestinationCreate, DestinationUpdate, SourceCreate, SourceUpdate};
use crate::diff::{diff_configs, ConfigMap, DiffTree};
use crate::model::{Destination, Initialized, Source};

use super::error::{ReconcileError, Result};
use super::scope::ReconcileScope;

/// An entity kind the shared reconciliation loop can manage.
///
/// Sources and destinations reconcile identically apart from the endpoints
/// they call and the field carrying their connector type; this trait
/// captures exactly that difference.
#[async_trait]
pub trait ManagedEntity: Clone + Send + Sync {
    /// Kind label used in logs and errors.
    const KIND: &'static str;

    fn name(&self) -> &str;

    /// Connector type name, matched against instance definitions.
    fn type_name(&self) -> &str;

    fn configuration(&self) -> &ConfigMap;

    /// Whether converging onto `observed` requires delete and recreate
    /// instead of an update in place.
    fn requires_recreate(&self, observed: &Self) -> bool;

    /// Resolves the connector type name to its definition id.
    async fn definition_id(scope: &mut ReconcileScope<'_>, type_name: &str) -> Result<Uuid>;

    async fn create(scope: &ReconcileScope<'_>, definition_id: Uuid, entity: &Self)
        -> Result<Uuid>;

    async fn update(scope: &ReconcileScope<'_>, id: Uuid, entity: &Self) -> Result<()>;

    async fn delete(scope: &ReconcileScope<'_>, id: Uuid) -> Result<()>;
}

#[async_trait]
impl ManagedEntity for Source {
    const KIND: &'static str = "source";

    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        &self.source_type
    }

    fn configuration(&self) -> &ConfigMap {
        &self.configuration
    }

    fn requires_recreate(&self, observed: &Self) -> bool {
        self.must_be_recreated(observed)
    }

    async fn definition_id(scope: &mut ReconcileScope<'_>, type_name: &str) -> Result<Uuid> {
        scope.source_definition_id(type_name).await
    }

    async fn create(
        scope: &ReconcileScope<'_>,
        definition_id: Uuid,
        entity: &Self,
    ) -> Result<Uuid> {
        let created = scope
            .client()
            .create_source(&SourceCreate {
                workspace_id: scope.workspace_id(),
                source_definition_id: definition_id,
                name: entity.name.clone(),
                connection_configuration: entity.configuration.clone(),
            })
            .await?;
        Ok(created.source_id)
    }

    async fn update(scope: &ReconcileScope<'_>, id: Uuid, entity: &Self) -> Result<()> {
        scope
            .client()
            .update_source(&SourceUpdate {
                source_id: id,
                name: entity.name.clone(),
                connection_configuration: entity.configuration.clone(),
            })
            .await?;
        Ok(())
    }

    async fn delete(scope: &ReconcileScope<'_>, id: Uuid) -> Result<()> {
        scope.client().delete_source(id).await?;
        Ok(())
    }
}

#[async_trait]
impl ManagedEntity for Destination {
    const KIND: &'static str = "destination";

    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        &self.destination_type
    }

    fn configuration(&self) -> &ConfigMap {
        &self.configuration
    }

    fn requires_recreate(&self, observed: &Self) -> bool {
        self.must_be_recreated(observed)
    }

    async fn definition_id(scope: &mut ReconcileScope<'_>, type_name: &str) -> Result<Uuid> {
        scope.destination_definition_id(type_name).await
    }

    async fn create(
        scope: &ReconcileScope<'_>,
        definition_id: Uuid,
        entity: &Self,
    ) -> Result<Uuid> {
        let created = scope
            .client()
            .create_destination(&DestinationCreate {
                workspace_id: scope.workspace_id(),
                destination_definition_id: definition_id,
                name: entity.name.clone(),
                connection_configuration: entity.configuration.clone(),
            })
            .await?;
        Ok(created.destination_id)
    }

    async fn update(scope: &ReconcileScope<'_>, id: Uuid, entity: &Self) -> Result<()> {
        scope
            .client()
            .update_destination(&DestinationUpdate {
                destination_id: id,
                name: entity.name.clone(),
                connection_configuration: entity.configuration.clone(),
            })
            .await?;
        Ok(())
    }

    async fn delete(scope: &ReconcileScope<'_>, id: Uuid) -> Result<()> {
        scope.client().delete_destination(id).await?;
        Ok(())
    }
}

/// Computes the diff one entity contributes, nested under its name.
///
/// The connector type participates alongside the configuration, so a bare
/// entity addition and a type change both show up even when the
/// configuration itself is empty or unchanged.
pub fn entity_diff<E: ManagedEntity>(
    name: &str,
    desired: Option<&E>,
    observed: Option<&E>,
) -> DiffTree {
    let mut inner = match (desired, observed) {
        (Some(desired), Some(observed)) if desired.type_name() != observed.type_name() => {
            DiffTree::new().change("type", observed.type_name(), desired.type_name())
        }
        (Some(desired), None) => DiffTree::new().add("type", desired.type_name()),
        (None, Some(observed)) => DiffTree::new().remove("type", observed.type_name()),
        _ => DiffTree::new(),
    };

    let empty = ConfigMap::new();
    let desired_config = desired.map(|e| e.configuration()).unwrap_or(&empty);
    let observed_config = observed.map(|e| e.configuration()).unwrap_or(&empty);
    inner = inner.join(diff_configs(desired_config, observed_config));

    if inner.is_empty() {
        DiffTree::new()
    } else {
        DiffTree::new().with_child(name, inner)
    }
}

/// Reconciles one entity kind against its observed set.
///
/// Returns the converged map of initialized entities plus the diff the pass
/// produced. Observed entities not in `desired` pass through untouched
/// unless `delete_unmentioned` is set. A connector type change deletes the
/// observed entity and creates a replacement in the same pass. An entity
/// whose diff is empty is left alone. With `dry_run` no mutating call is
/// issued and would-be creations carry no remote id.
pub async fn reconcile_entities<E: ManagedEntity>(
    scope: &mut ReconcileScope<'_>,
    desired: &BTreeMap<String, E>,
    observed: &BTreeMap<String, Initialized<E>>,
    delete_unmentioned: bool,
    dry_run: bool,
) -> Result<(BTreeMap<String, Initialized<E>>, DiffTree)> {
    let mut result: BTreeMap<String, Initialized<E>> = BTreeMap::new();
    let mut diff = DiffTree::new();

    let mut names: BTreeSet<&String> = desired.keys().collect();
    names.extend(observed.keys());

    for name in names {
        let configured = desired.get(name);
        let mut existing = observed.get(name).cloned();

        // Unmentioned remote entities are adopted, not managed.
        if configured.is_none() && !delete_unmentioned {
            if let Some(existing) = existing {
                log::debug!("Adopting unmanaged {} '{}'", E::KIND, name);
                result.insert(name.clone(), existing);
            }
            continue;
        }

        let entry_diff = entity_diff(name, configured, existing.as_ref().map(|e| &e.entity));
        let unchanged = entry_diff.is_empty();
        diff = diff.join(entry_diff);

        let must_recreate = match (&existing, configured) {
            (Some(_), None) => true,
            (Some(current), Some(configured)) => configured.requires_recreate(&current.entity),
            (None, _) => false,
        };
        if must_recreate {
            if let Some(current) = existing.take() {
                let id = current.id.ok_or_else(|| ReconcileError::MissingRemoteId {
                    kind: E::KIND,
                    name: name.clone(),
                    operation: "delete",
                })?;
                if dry_run {
                    log::info!("Would delete {} '{}'", E::KIND, name);
                } else {
                    log::info!("Deleting {} '{}'", E::KIND, name);
                    E::delete(scope, id).await?;
                }
            }
        }

        let Some(configured) = configured else {
            continue;
        };

        // Read-only, so it runs in dry runs too: an unknown connector type
        // fails the check, not just the apply.
        let definition_id = E::definition_id(scope, configured.type_name()).await?;

        let initialized = match existing {
            Some(current) => {
                let id = current.id.ok_or_else(|| ReconcileError::MissingRemoteId {
                    kind: E::KIND,
                    name: name.clone(),
                    operation: "update",
                })?;
                if !unchanged {
                    if dry_run {
                        log::info!("Would update {} '{}'", E::KIND, name);
                    } else {
                        log::info!("Updating {} '{}'", E::KIND, name);
                        E::update(scope, id, configured).await?;
                    }
                }
                Initialized::new(configured.clone(), Some(id), Some(definition_id))
            }
            None => {
                let id = if dry_run {
                    log::info!("Would create {} '{}'", E::KIND, name);
                    None
                } else {
                    log::info!("Creating {} '{}'", E::KIND, name);
                    Some(E::create(scope, definition_id, configured).await?)
                };
                Initialized::new(configured.clone(), id, Some(definition_id))
            }
        };
        result.insert(name.clone(), initialized);
    }

    Ok((result, diff))
}
