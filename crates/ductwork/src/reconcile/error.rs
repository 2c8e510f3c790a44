//! Error types for the reconciliation engine.

use thiserror::Error;
use uuid::Uuid;

use crate::api::ApiError;

/// Broad classification of a reconciliation failure.
///
/// `Configuration` errors are user-fixable, `Consistency` errors mean the
/// instance holds state the engine cannot interpret, and `Transport` errors
/// come from the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Consistency,
    Transport,
}

/// Errors that can occur during a reconciliation pass.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A configured connector type has no definition on the instance.
    #[error("Unknown {kind} type '{type_name}': no matching connector definition on the instance")]
    UnknownConnectorType {
        /// Entity kind, `source` or `destination`.
        kind: &'static str,
        /// The configured connector type name.
        type_name: String,
    },

    /// Normalization was requested on a destination that cannot run it.
    #[error("Destination '{destination}' does not support normalization")]
    NormalizationUnsupported {
        /// Name of the offending destination.
        destination: String,
    },

    /// A connection references an entity absent from the pass.
    #[error("Connection '{connection}' references {kind} '{name}' which is not part of this pass")]
    MissingEntity {
        /// Name of the connection holding the reference.
        connection: String,
        /// Entity kind, `source` or `destination`.
        kind: &'static str,
        /// The referenced entity name.
        name: String,
    },

    /// An observed connection references an entity id the inventory does
    /// not know.
    #[error("Observed connection '{connection}' references unknown {kind} {id}")]
    UndecodableReference {
        /// Name of the observed connection.
        connection: String,
        /// Entity kind, `source` or `destination`.
        kind: &'static str,
        /// The unresolvable remote id.
        id: Uuid,
    },

    /// An observed stream uses a sync-mode pair the engine does not model.
    #[error(
        "Observed connection '{connection}' syncs stream '{stream}' with \
         unsupported mode pair {sync_mode}/{destination_sync_mode}"
    )]
    UnknownSyncModes {
        /// Name of the observed connection.
        connection: String,
        /// The offending stream.
        stream: String,
        /// Source-side wire value.
        sync_mode: String,
        /// Destination-side wire value.
        destination_sync_mode: String,
    },

    /// An entity that should carry a remote id does not.
    #[error("{kind} '{name}' has no remote id; cannot {operation}")]
    MissingRemoteId {
        /// Entity kind.
        kind: &'static str,
        /// Entity name.
        name: String,
        /// The operation that needed the id.
        operation: &'static str,
    },

    /// The instance API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ReconcileError {
    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::UnknownConnectorType { .. }
            | ReconcileError::NormalizationUnsupported { .. }
            | ReconcileError::MissingEntity { .. } => ErrorKind::Configuration,
            ReconcileError::UndecodableReference { .. }
            | ReconcileError::UnknownSyncModes { .. }
            | ReconcileError::MissingRemoteId { .. } => ErrorKind::Consistency,
            ReconcileError::Api(_) => ErrorKind::Transport,
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
