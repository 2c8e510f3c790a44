//! Client for the instance configuration API.
//!
//! The reconciliation engine talks to the instance exclusively through the
//! [`InstanceClient`] trait; [`HttpInstanceClient`] is the production
//! implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpInstanceClient, InstanceClient, InstanceConfig};
pub use error::{ApiError, Result};
pub use types::{
    CatalogStream, ConnectionBase, ConnectionCreate, ConnectionRead, ConnectionUpdate,
    DefinitionRead, DestinationCreate, DestinationRead, DestinationUpdate, NormalizationOperator,
    OperationCreate, OperationRead, OperatorConfiguration, SchemaDiscovery, SourceCreate,
    SourceRead, SourceUpdate, StreamDescriptor, StreamSettings, SyncCatalog, WorkspaceRead,
};
