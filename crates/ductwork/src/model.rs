//! Desired-state model for managed entities.
//!
//! A [`Connection`] owns the [`Source`] and [`Destination`] it syncs between;
//! the reconciler derives the full set of managed entities from the
//! connections it is given. Entities are identified by name, which must be
//! unique per kind within a workspace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::diff::ConfigMap;

/// How a stream is read from its source and written into its destination.
/// Only the four combinations the sync protocol accepts are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    FullRefreshOverwrite,
    FullRefreshAppend,
    IncrementalAppend,
    IncrementalAppendDedup,
}

impl SyncMode {
    /// Wire value for the source-side half of the pair.
    pub fn sync_mode(&self) -> &'static str {
        match self {
            SyncMode::FullRefreshOverwrite | SyncMode::FullRefreshAppend => "full_refresh",
            SyncMode::IncrementalAppend | SyncMode::IncrementalAppendDedup => "incremental",
        }
    }

    /// Wire value for the destination-side half of the pair.
    pub fn destination_sync_mode(&self) -> &'static str {
        match self {
            SyncMode::FullRefreshOverwrite => "overwrite",
            SyncMode::FullRefreshAppend | SyncMode::IncrementalAppend => "append",
            SyncMode::IncrementalAppendDedup => "append_dedup",
        }
    }

    /// Reassembles a mode from its wire pair, if the combination is valid.
    pub fn from_wire(sync_mode: &str, destination_sync_mode: &str) -> Option<Self> {
        match (sync_mode, destination_sync_mode) {
            ("full_refresh", "overwrite") => Some(SyncMode::FullRefreshOverwrite),
            ("full_refresh", "append") => Some(SyncMode::FullRefreshAppend),
            ("incremental", "append") => Some(SyncMode::IncrementalAppend),
            ("incremental", "append_dedup") => Some(SyncMode::IncrementalAppendDedup),
            _ => None,
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncMode::FullRefreshOverwrite => "full_refresh_overwrite",
            SyncMode::FullRefreshAppend => "full_refresh_append",
            SyncMode::IncrementalAppend => "incremental_append",
            SyncMode::IncrementalAppendDedup => "incremental_append_dedup",
        };
        write!(f, "{}", name)
    }
}

/// Whether basic normalization should run on a connection.
///
/// `Unset` leaves the decision to the destination: destinations that support
/// normalization get it, destinations that do not are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationSetting {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl NormalizationSetting {
    /// Builds the setting from an optional flag, mapping absence to `Unset`.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => NormalizationSetting::Unset,
            Some(true) => NormalizationSetting::Enabled,
            Some(false) => NormalizationSetting::Disabled,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, NormalizationSetting::Unset)
    }
}

/// A user-defined source of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Unique name within the workspace.
    pub name: String,

    /// Connector type. Immutable once created: changing it forces the
    /// source to be deleted and recreated.
    pub source_type: String,

    /// Connector-specific configuration.
    pub configuration: ConfigMap,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        source_type: impl Into<String>,
        configuration: ConfigMap,
    ) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            configuration,
        }
    }

    /// True when converging `self` onto `observed` requires a delete and
    /// recreate instead of an update in place.
    pub fn must_be_recreated(&self, observed: &Source) -> bool {
        self.source_type != observed.source_type
    }
}

/// A user-defined destination for records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Unique name within the workspace.
    pub name: String,

    /// Connector type. Immutable once created: changing it forces the
    /// destination to be deleted and recreated.
    pub destination_type: String,

    /// Connector-specific configuration.
    pub configuration: ConfigMap,
}

impl Destination {
    pub fn new(
        name: impl Into<String>,
        destination_type: impl Into<String>,
        configuration: ConfigMap,
    ) -> Self {
        Self {
            name: name.into(),
            destination_type: destination_type.into(),
            configuration,
        }
    }

    /// True when converging `self` onto `observed` requires a delete and
    /// recreate instead of an update in place.
    pub fn must_be_recreated(&self, observed: &Destination) -> bool {
        self.destination_type != observed.destination_type
    }
}

/// A sync relationship between one source and one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Unique name within the workspace.
    pub name: String,

    /// The source records are read from.
    pub source: Source,

    /// The destination records are written into.
    pub destination: Destination,

    /// Streams to sync, keyed by stream name.
    pub stream_config: BTreeMap<String, SyncMode>,

    /// Basic-normalization intent.
    #[serde(default)]
    pub normalization: NormalizationSetting,
}

impl Connection {
    pub fn new(
        name: impl Into<String>,
        source: Source,
        destination: Destination,
        stream_config: BTreeMap<String, SyncMode>,
        normalization: NormalizationSetting,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            stream_config,
            normalization,
        }
    }

    /// True when the observed connection binds entities that are themselves
    /// about to be recreated, so an update in place is impossible.
    ///
    /// Only connector type changes count. Re-pointing at a different endpoint
    /// of the same type does not trigger teardown, and connection updates
    /// carry no endpoint ids, so that divergence stays visible in the diff
    /// instead of converging.
    pub fn must_be_recreated(&self, observed: &Connection) -> bool {
        self.source.must_be_recreated(&observed.source)
            || self.destination.must_be_recreated(&observed.destination)
    }
}

/// A desired entity paired with the identifiers it has on the instance.
///
/// `id` is `None` only for the placeholder records a dry run produces in
/// place of entities it would have created.
#[derive(Debug, Clone)]
pub struct Initialized<T> {
    pub entity: T,
    pub id: Option<Uuid>,
    pub definition_id: Option<Uuid>,
}

impl<T> Initialized<T> {
    pub fn new(entity: T, id: Option<Uuid>, definition_id: Option<Uuid>) -> Self {
        Self {
            entity,
            id,
            definition_id,
        }
    }
}

pub type InitializedSource = Initialized<Source>;
pub type InitializedDestination = Initialized<Destination>;

/// An observed connection paired with its remote id.
#[derive(Debug, Clone)]
pub struct InitializedConnection {
    pub connection: Connection,
    pub connection_id: Uuid,
}
