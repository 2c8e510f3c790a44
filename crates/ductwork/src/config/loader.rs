//! Configuration loader for multi-file YAML configurations.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::model::{Connection, Destination, NormalizationSetting, Source};

use super::error::{ConfigError, Result};
use super::resource::{
    AnyResource, ConnectionResource, DestinationResource, InstanceResource, ResourceHeader,
    ResourceKind, ResourceWithPath, SourceResource, API_VERSION,
};

/// Loaded configuration from the config directory.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The instance resource (required).
    pub instance: ResourceWithPath<InstanceResource>,
    /// All source resources, sorted by name.
    pub sources: Vec<ResourceWithPath<SourceResource>>,
    /// All destination resources, sorted by name.
    pub destinations: Vec<ResourceWithPath<DestinationResource>>,
    /// All connection resources, sorted by name.
    pub connections: Vec<ResourceWithPath<ConnectionResource>>,
}

impl LoadedConfig {
    /// Resolves connection resources into the desired-state model, turning
    /// each name reference into an owned copy of the referenced entity.
    pub fn resolve(&self) -> Result<Vec<Connection>> {
        let sources: BTreeMap<&str, Source> = self
            .sources
            .iter()
            .map(|s| {
                (
                    s.resource.name(),
                    Source::new(
                        s.resource.name(),
                        s.resource.spec.source_type.clone(),
                        s.resource.spec.configuration.clone(),
                    ),
                )
            })
            .collect();
        let destinations: BTreeMap<&str, Destination> = self
            .destinations
            .iter()
            .map(|d| {
                (
                    d.resource.name(),
                    Destination::new(
                        d.resource.name(),
                        d.resource.spec.destination_type.clone(),
                        d.resource.spec.configuration.clone(),
                    ),
                )
            })
            .collect();

        let mut connections = Vec::with_capacity(self.connections.len());
        for conn in &self.connections {
            let spec = &conn.resource.spec;
            let source = sources.get(spec.source.as_str()).cloned().ok_or_else(|| {
                ConfigError::UnresolvedReference {
                    connection: conn.resource.name().to_string(),
                    kind: "Source".to_string(),
                    name: spec.source.clone(),
                }
            })?;
            let destination = destinations
                .get(spec.destination.as_str())
                .cloned()
                .ok_or_else(|| ConfigError::UnresolvedReference {
                    connection: conn.resource.name().to_string(),
                    kind: "Destination".to_string(),
                    name: spec.destination.clone(),
                })?;

            connections.push(Connection::new(
                conn.resource.name(),
                source,
                destination,
                spec.streams.clone(),
                NormalizationSetting::from_flag(spec.normalize),
            ));
        }

        Ok(connections)
    }
}

/// Configuration loader for the declarative config directory.
pub struct ConfigLoader {
    /// Root directory for configuration files.
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new config loader for the given directory.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Returns the config directory path.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads all configuration from the config directory.
    pub fn load(&self) -> Result<LoadedConfig> {
        if !self.config_dir.exists() {
            return Err(ConfigError::ConfigDirNotFound(self.config_dir.clone()));
        }

        let mut instance: Option<ResourceWithPath<InstanceResource>> = None;
        let mut sources: Vec<ResourceWithPath<SourceResource>> = Vec::new();
        let mut destinations: Vec<ResourceWithPath<DestinationResource>> = Vec::new();
        let mut connections: Vec<ResourceWithPath<ConnectionResource>> = Vec::new();

        // Walk the config directory
        for entry in WalkDir::new(&self.config_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            // Only process YAML files
            if !path.is_file() {
                continue;
            }

            // Skip files in hidden directories or hidden files themselves
            if let Ok(relative) = path.strip_prefix(&self.config_dir) {
                let has_hidden_component = relative.components().any(|c| {
                    c.as_os_str()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
                });
                if has_hidden_component {
                    continue;
                }
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "yaml" && ext != "yml" {
                continue;
            }

            match self.load_file(path) {
                Ok(resource) => {
                    let relative_path = path
                        .strip_prefix(&self.config_dir)
                        .unwrap_or(path)
                        .to_path_buf();

                    match resource {
                        AnyResource::Instance(r) => {
                            if instance.is_some() {
                                return Err(ConfigError::DuplicateName {
                                    kind: "Instance".to_string(),
                                    name: r.metadata.name.clone(),
                                });
                            }
                            instance = Some(ResourceWithPath::new(r, relative_path));
                        }
                        AnyResource::Source(r) => {
                            if sources
                                .iter()
                                .any(|s| s.resource.metadata.name == r.metadata.name)
                            {
                                return Err(ConfigError::DuplicateName {
                                    kind: "Source".to_string(),
                                    name: r.metadata.name.clone(),
                                });
                            }
                            sources.push(ResourceWithPath::new(r, relative_path));
                        }
                        AnyResource::Destination(r) => {
                            if destinations
                                .iter()
                                .any(|d| d.resource.metadata.name == r.metadata.name)
                            {
                                return Err(ConfigError::DuplicateName {
                                    kind: "Destination".to_string(),
                                    name: r.metadata.name.clone(),
                                });
                            }
                            destinations.push(ResourceWithPath::new(r, relative_path));
                        }
                        AnyResource::Connection(r) => {
                            if connections
                                .iter()
                                .any(|c| c.resource.metadata.name == r.metadata.name)
                            {
                                return Err(ConfigError::DuplicateName {
                                    kind: "Connection".to_string(),
                                    name: r.metadata.name.clone(),
                                });
                            }
                            connections.push(ResourceWithPath::new(r, relative_path));
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to load {}: {}", path.display(), e);
                    return Err(e);
                }
            }
        }

        // Ensure the instance resource exists
        let instance = instance.ok_or(ConfigError::MissingInstance)?;

        sources.sort_by(|a, b| a.resource.metadata.name.cmp(&b.resource.metadata.name));
        destinations.sort_by(|a, b| a.resource.metadata.name.cmp(&b.resource.metadata.name));
        connections.sort_by(|a, b| a.resource.metadata.name.cmp(&b.resource.metadata.name));

        Ok(LoadedConfig {
            instance,
            sources,
            destinations,
            connections,
        })
    }

    /// Loads a single resource file.
    pub fn load_file(&self, path: &Path) -> Result<AnyResource> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.parse_resource(&content, path)
    }

    /// Parses a resource from YAML content.
    ///
    /// The header is parsed first so the document can be decoded against the
    /// right spec; `Source` and `Destination` documents are shaped
    /// identically apart from their `kind`.
    pub fn parse_resource(&self, content: &str, path: &Path) -> Result<AnyResource> {
        let header: ResourceHeader =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        // Validate API version
        if header.api_version != API_VERSION {
            return Err(ConfigError::InvalidApiVersion {
                version: header.api_version,
                expected: API_VERSION.to_string(),
            });
        }

        let kind: ResourceKind = header
            .kind
            .parse()
            .map_err(|_| ConfigError::UnknownKind(header.kind.clone()))?;

        // Parse based on kind
        match kind {
            ResourceKind::Instance => {
                let resource: InstanceResource =
                    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(AnyResource::Instance(resource))
            }
            ResourceKind::Source => {
                let resource: SourceResource =
                    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(AnyResource::Source(resource))
            }
            ResourceKind::Destination => {
                let resource: DestinationResource =
                    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(AnyResource::Destination(resource))
            }
            ResourceKind::Connection => {
                let resource: ConnectionResource =
                    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(AnyResource::Connection(resource))
            }
        }
    }
}
