//! Configuration-layer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or resolving declarative config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in '{path}': {message}")]
    ParseYaml { path: PathBuf, message: String },

    #[error("Invalid API version '{version}', expected '{expected}'")]
    InvalidApiVersion { version: String, expected: String },

    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("Duplicate resource name '{name}' for kind '{kind}'")]
    DuplicateName { kind: String, name: String },

    #[error("Config directory not found: {0}")]
    ConfigDirNotFound(PathBuf),

    #[error("Instance resource is required but not found")]
    MissingInstance,

    #[error("Connection '{connection}' references unknown {kind} '{name}'")]
    UnresolvedReference {
        connection: String,
        kind: String,
        name: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
