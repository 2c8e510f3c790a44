//! Builder patterns for creating desired-state test data programmatically.
//!
//! These builders allow assembling connections without repetitive
//! boilerplate code.

#![allow(dead_code)]

use std::collections::BTreeMap;

use ductwork::{
    ConfigMap, ConfigValue, Connection, Destination, NormalizationSetting, Source, SyncMode,
};

/// Builder for creating `Source` instances.
pub struct SourceBuilder {
    name: String,
    source_type: String,
    configuration: ConfigMap,
}

impl SourceBuilder {
    /// Create a new builder with sensible defaults for testing.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: "postgres".to_string(),
            configuration: ConfigMap::new(),
        }
    }

    /// Set the connector type.
    pub fn source_type(mut self, source_type: &str) -> Self {
        self.source_type = source_type.to_string();
        self
    }

    /// Set one configuration key.
    pub fn config(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.configuration.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> Source {
        Source::new(self.name, self.source_type, self.configuration)
    }
}

/// Builder for creating `Destination` instances.
pub struct DestinationBuilder {
    name: String,
    destination_type: String,
    configuration: ConfigMap,
}

impl DestinationBuilder {
    /// Create a new builder with sensible defaults for testing.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            destination_type: "s3".to_string(),
            configuration: ConfigMap::new(),
        }
    }

    /// Set the connector type.
    pub fn destination_type(mut self, destination_type: &str) -> Self {
        self.destination_type = destination_type.to_string();
        self
    }

    /// Set one configuration key.
    pub fn config(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.configuration.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> Destination {
        Destination::new(self.name, self.destination_type, self.configuration)
    }
}

/// Builder for creating `Connection` instances.
///
/// Defaults to a `pg` source, a `lake` destination, no streams and unset
/// normalization.
pub struct ConnectionBuilder {
    name: String,
    source: Source,
    destination: Destination,
    streams: BTreeMap<String, SyncMode>,
    normalization: NormalizationSetting,
}

impl ConnectionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SourceBuilder::new("pg").build(),
            destination: DestinationBuilder::new("lake").build(),
            streams: BTreeMap::new(),
            normalization: NormalizationSetting::Unset,
        }
    }

    /// Set the source endpoint.
    pub fn source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Set the destination endpoint.
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Add one stream with its sync mode.
    pub fn stream(mut self, name: &str, mode: SyncMode) -> Self {
        self.streams.insert(name.to_string(), mode);
        self
    }

    /// Set explicit normalization intent. Unset stays the default.
    pub fn normalize(mut self, enabled: bool) -> Self {
        self.normalization = NormalizationSetting::from_flag(Some(enabled));
        self
    }

    pub fn build(self) -> Connection {
        Connection::new(
            self.name,
            self.source,
            self.destination,
            self.streams,
            self.normalization,
        )
    }
}
