//! Declarative configuration for ductwork.
//!
//! This module provides a Kubernetes-style configuration system with:
//! - Multi-file YAML configurations
//! - Four resource kinds: Instance, Source, Destination, Connection
//! - Name-reference resolution from connections to their entities
//! - Cross-resource validation

pub mod error;
pub mod loader;
pub mod resource;
pub mod validation;

pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, LoadedConfig};
pub use resource::{
    AnyResource, ConnectionResource, ConnectionSpec, DestinationResource, DestinationSpec,
    InstanceResource, InstanceSpec, ObjectMeta, Resource, ResourceKind, ResourceWithPath,
    SourceResource, SourceSpec, API_VERSION,
};
pub use validation::ConfigValidator;
