//! Declarative reconciliation of a remote instance.
//!
//! The engine converges a workspace to a desired set of connections and the
//! sources and destinations they reference:
//! - Structural diffing of desired against observed configuration
//! - Update-in-place where possible, delete-and-recreate where a connector
//!   type changed
//! - Two-phase connection handling so the instance's referential
//!   constraints are never violated
//! - A dry-run mode producing the same diff as an apply with zero mutations

pub mod connections;
pub mod entity;
pub mod error;
pub mod inventory;
pub mod normalization;
pub mod scope;
pub mod streams;

pub use entity::{entity_diff, reconcile_entities, ManagedEntity};
pub use error::{ErrorKind, ReconcileError, Result};
pub use inventory::RemoteInventory;
pub use scope::ReconcileScope;
pub use streams::merge_streams;

use std::collections::BTreeMap;

use tracing::Instrument;
use uuid::Uuid;

use crate::api::InstanceClient;
use crate::diff::DiffTree;
use crate::model::{Connection, Destination, Source};

/// Drives one reconciliation pass against a workspace.
///
/// The desired state is a list of [`Connection`]s; the sources and
/// destinations to manage are derived from the endpoints those connections
/// reference. [`check`](Reconciler::check) computes the diff without
/// touching the instance, [`apply`](Reconciler::apply) converges it.
pub struct Reconciler<'a> {
    client: &'a dyn InstanceClient,
    workspace_id: Option<Uuid>,
    delete_unmentioned: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn InstanceClient) -> Self {
        Self {
            client,
            workspace_id: None,
            delete_unmentioned: false,
        }
    }

    /// Pins the pass to a workspace instead of the instance default.
    pub fn with_workspace(mut self, workspace_id: Uuid) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    /// Also deletes remote entities the desired configuration does not
    /// mention. Off by default: unmentioned entities are adopted untouched.
    pub fn with_delete_unmentioned(mut self, delete_unmentioned: bool) -> Self {
        self.delete_unmentioned = delete_unmentioned;
        self
    }

    /// Computes the diff between desired and observed state without issuing
    /// any mutating call.
    pub async fn check(&self, connections: &[Connection]) -> Result<DiffTree> {
        self.reconcile(connections, true).await
    }

    /// Converges the instance to the desired state and returns the diff of
    /// what changed.
    pub async fn apply(&self, connections: &[Connection]) -> Result<DiffTree> {
        self.reconcile(connections, false).await
    }

    /// Runs the fixed reconciliation sequence: fetch inventory, tear down
    /// blocking connections, reconcile sources, reconcile destinations,
    /// rebuild connections against the final ids.
    async fn reconcile(&self, connections: &[Connection], dry_run: bool) -> Result<DiffTree> {
        let workspace_id = match self.workspace_id {
            Some(id) => id,
            None => self.client.default_workspace().await?.workspace_id,
        };
        log::info!(
            "Reconciling {} connection(s) against workspace {}{}",
            connections.len(),
            workspace_id,
            if dry_run { " (dry run)" } else { "" }
        );

        let mut scope = ReconcileScope::new(self.client, workspace_id);
        let (desired_sources, desired_destinations, desired_connections) =
            desired_state(connections);

        let inventory = RemoteInventory::fetch(&scope).await?;

        let connections_diff = connections::reconcile_pre(
            &scope,
            &desired_connections,
            &inventory.sources,
            &inventory.destinations,
            self.delete_unmentioned,
            dry_run,
        )
        .instrument(tracing::info_span!("reconcile.pre_phase"))
        .await?;

        let (sources, sources_diff) = reconcile_entities(
            &mut scope,
            &desired_sources,
            &inventory.sources,
            self.delete_unmentioned,
            dry_run,
        )
        .instrument(tracing::info_span!("reconcile.sources"))
        .await?;

        let (destinations, destinations_diff) = reconcile_entities(
            &mut scope,
            &desired_destinations,
            &inventory.destinations,
            self.delete_unmentioned,
            dry_run,
        )
        .instrument(tracing::info_span!("reconcile.destinations"))
        .await?;

        if !dry_run {
            connections::reconcile_post(&mut scope, &desired_connections, &sources, &destinations)
                .instrument(tracing::info_span!("reconcile.post_phase"))
                .await?;
        }

        let diff = sources_diff.join(destinations_diff).join(connections_diff);
        if diff.is_empty() {
            log::info!("Reconciliation found nothing to change");
        }
        Ok(diff)
    }
}

/// Derives the desired entity maps from the connection list. Connections
/// sharing an endpoint collapse onto one entry per name.
fn desired_state(
    connections: &[Connection],
) -> (
    BTreeMap<String, Source>,
    BTreeMap<String, Destination>,
    BTreeMap<String, Connection>,
) {
    let mut sources = BTreeMap::new();
    let mut destinations = BTreeMap::new();
    let mut desired = BTreeMap::new();
    for connection in connections {
        sources.insert(connection.source.name.clone(), connection.source.clone());
        destinations.insert(
            connection.destination.name.clone(),
            connection.destination.clone(),
        );
        desired.insert(connection.name.clone(), connection.clone());
    }
    (sources, destinations, desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ConfigMap;
    use crate::model::NormalizationSetting;

    fn connection(name: &str, source_name: &str, destination_name: &str) -> Connection {
        Connection::new(
            name,
            Source::new(source_name, "postgres", ConfigMap::new()),
            Destination::new(destination_name, "s3", ConfigMap::new()),
            BTreeMap::new(),
            NormalizationSetting::Unset,
        )
    }

    #[test]
    fn test_desired_state_collapses_shared_endpoints() {
        let connections = vec![
            connection("a-to-lake", "pg", "lake"),
            connection("b-to-lake", "pg", "lake"),
        ];
        let (sources, destinations, desired) = desired_state(&connections);
        assert_eq!(sources.len(), 1);
        assert_eq!(destinations.len(), 1);
        assert_eq!(desired.len(), 2);
    }

    #[test]
    fn test_desired_state_keys_by_name() {
        let connections = vec![connection("pg-to-lake", "pg", "lake")];
        let (sources, destinations, desired) = desired_state(&connections);
        assert!(sources.contains_key("pg"));
        assert!(destinations.contains_key("lake"));
        assert!(desired.contains_key("pg-to-lake"));
    }
}
