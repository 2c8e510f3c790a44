//! Cross-resource validation for the declarative configuration.

use std::collections::HashSet;

use super::error::{ConfigError, Result};
use super::loader::LoadedConfig;
use super::resource::{ConnectionResource, DestinationResource, InstanceResource, SourceResource};

/// Validator for the loaded configuration.
pub struct ConfigValidator {
    /// Collected validation errors.
    errors: Vec<String>,
}

impl ConfigValidator {
    /// Creates a new validator.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Validates the entire loaded configuration.
    pub fn validate(&mut self, config: &LoadedConfig) -> Result<()> {
        self.errors.clear();

        self.validate_instance(&config.instance.resource);

        for source in &config.sources {
            self.validate_source(&source.resource);
        }

        for destination in &config.destinations {
            self.validate_destination(&destination.resource);
        }

        for connection in &config.connections {
            self.validate_connection(&connection.resource);
        }

        // Cross-resource validation
        self.validate_references(config);
        self.validate_unique_names(config);
        self.warn_unreferenced_entities(config);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(self.errors.join("; ")))
        }
    }

    /// Validates the instance resource.
    fn validate_instance(&mut self, instance: &InstanceResource) {
        if instance.spec.host.is_empty() {
            self.errors.push("Instance: host is required".to_string());
        }

        if instance.spec.port == 0 {
            self.errors
                .push("Instance: port must be greater than 0".to_string());
        }

        if instance.spec.request_timeout_secs == 0 {
            self.errors
                .push("Instance: requestTimeoutSecs must be greater than 0".to_string());
        }
    }

    /// Validates a source resource.
    fn validate_source(&mut self, source: &SourceResource) {
        let name = &source.metadata.name;

        if name.is_empty() {
            self.errors.push("Source: name is required".to_string());
            return;
        }

        if !is_valid_identifier(name) {
            self.errors.push(format!(
                "Source '{}': name must be a valid identifier (letters, numbers, underscores, hyphens)",
                name
            ));
        }

        if source.spec.source_type.is_empty() {
            self.errors
                .push(format!("Source '{}': type is required", name));
        }
    }

    /// Validates a destination resource.
    fn validate_destination(&mut self, destination: &DestinationResource) {
        let name = &destination.metadata.name;

        if name.is_empty() {
            self.errors.push("Destination: name is required".to_string());
            return;
        }

        if !is_valid_identifier(name) {
            self.errors.push(format!(
                "Destination '{}': name must be a valid identifier (letters, numbers, underscores, hyphens)",
                name
            ));
        }

        if destination.spec.destination_type.is_empty() {
            self.errors
                .push(format!("Destination '{}': type is required", name));
        }
    }

    /// Validates a connection resource.
    ///
    /// An empty stream table is accepted; such a connection syncs nothing
    /// until streams are selected.
    fn validate_connection(&mut self, connection: &ConnectionResource) {
        let name = &connection.metadata.name;

        if name.is_empty() {
            self.errors.push("Connection: name is required".to_string());
            return;
        }

        if !is_valid_identifier(name) {
            self.errors.push(format!(
                "Connection '{}': name must be a valid identifier",
                name
            ));
        }

        if connection.spec.source.is_empty() {
            self.errors
                .push(format!("Connection '{}': source is required", name));
        }

        if connection.spec.destination.is_empty() {
            self.errors
                .push(format!("Connection '{}': destination is required", name));
        }

        for stream in connection.spec.streams.keys() {
            if stream.is_empty() {
                self.errors.push(format!(
                    "Connection '{}': stream names must not be empty",
                    name
                ));
            }
        }
    }

    /// Validates that connection references resolve to defined entities.
    fn validate_references(&mut self, config: &LoadedConfig) {
        let source_names: HashSet<&str> = config
            .sources
            .iter()
            .map(|s| s.resource.metadata.name.as_str())
            .collect();
        let destination_names: HashSet<&str> = config
            .destinations
            .iter()
            .map(|d| d.resource.metadata.name.as_str())
            .collect();

        for connection in &config.connections {
            let name = &connection.resource.metadata.name;
            let spec = &connection.resource.spec;

            if !spec.source.is_empty() && !source_names.contains(spec.source.as_str()) {
                self.errors.push(format!(
                    "Connection '{}': references undefined source '{}'. Define it in sources/.",
                    name, spec.source
                ));
            }

            if !spec.destination.is_empty()
                && !destination_names.contains(spec.destination.as_str())
            {
                self.errors.push(format!(
                    "Connection '{}': references undefined destination '{}'. Define it in destinations/.",
                    name, spec.destination
                ));
            }
        }
    }

    /// Validates that resource names are unique within their kind.
    fn validate_unique_names(&mut self, config: &LoadedConfig) {
        let mut source_names: HashSet<&str> = HashSet::new();
        for source in &config.sources {
            let name = source.resource.metadata.name.as_str();
            if !source_names.insert(name) {
                self.errors
                    .push(format!("Duplicate source name: '{}'", name));
            }
        }

        let mut destination_names: HashSet<&str> = HashSet::new();
        for destination in &config.destinations {
            let name = destination.resource.metadata.name.as_str();
            if !destination_names.insert(name) {
                self.errors
                    .push(format!("Duplicate destination name: '{}'", name));
            }
        }

        let mut connection_names: HashSet<&str> = HashSet::new();
        for connection in &config.connections {
            let name = connection.resource.metadata.name.as_str();
            if !connection_names.insert(name) {
                self.errors
                    .push(format!("Duplicate connection name: '{}'", name));
            }
        }
    }

    /// Warns about sources and destinations no connection references.
    ///
    /// Unreferenced entities are still reconciled, so this is advisory only.
    fn warn_unreferenced_entities(&mut self, config: &LoadedConfig) {
        let referenced_sources: HashSet<&str> = config
            .connections
            .iter()
            .map(|c| c.resource.spec.source.as_str())
            .collect();
        let referenced_destinations: HashSet<&str> = config
            .connections
            .iter()
            .map(|c| c.resource.spec.destination.as_str())
            .collect();

        for source in &config.sources {
            let name = source.resource.metadata.name.as_str();
            if !referenced_sources.contains(name) {
                log::warn!("Source '{}' is not referenced by any connection", name);
            }
        }

        for destination in &config.destinations {
            let name = destination.resource.metadata.name.as_str();
            if !referenced_destinations.contains(name) {
                log::warn!(
                    "Destination '{}' is not referenced by any connection",
                    name
                );
            }
        }
    }

    /// Returns the collected errors.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks if a string is a valid identifier.
fn is_valid_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let first = s.chars().next().unwrap();
    if !first.is_alphabetic() && first != '_' {
        return false;
    }

    s.chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

// ============================================================================
// Tests
// ============================================================================
