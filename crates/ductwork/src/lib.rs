pub mod api;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod reconcile;

pub use api::{ApiError, HttpInstanceClient, InstanceClient, InstanceConfig};
pub use config::{ConfigError, ConfigLoader, ConfigValidator, LoadedConfig};
pub use diff::{diff_configs, ConfigMap, ConfigValue, DiffTree};
pub use error::{DuctworkError, Result};
pub use model::{
    Connection, Destination, InitializedConnection, InitializedDestination, InitializedSource,
    NormalizationSetting, Source, SyncMode,
};
pub use reconcile::{ErrorKind, ReconcileError, Reconciler, RemoteInventory};
