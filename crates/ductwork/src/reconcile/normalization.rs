//! Resolving a connection's normalization intent to an operation id.

use uuid::Uuid;

use crate::api::OperationCreate;
use crate::model::{InitializedDestination, NormalizationSetting};

use super::error::{ReconcileError, Result};
use super::scope::ReconcileScope;

/// Resolves the declared normalization setting to the operation id the
/// connection body should carry, or `None` for no normalization.
///
/// An existing connection's operations are listed first so a basic
/// normalization operation already attached is reused instead of recreated.
/// `Enabled` against a destination that cannot normalize is a configuration
/// error; `Unset` quietly settles for no normalization there.
pub async fn resolve(
    scope: &mut ReconcileScope<'_>,
    existing_connection_id: Option<Uuid>,
    destination: &InitializedDestination,
    intent: NormalizationSetting,
) -> Result<Option<Uuid>> {
    let mut existing_operation_id = None;
    if let Some(connection_id) = existing_connection_id {
        let operations = scope.client().list_operations(connection_id).await?;
        existing_operation_id = operations
            .iter()
            .find(|op| op.is_basic_normalization())
            .map(|op| op.operation_id);
    }

    if intent == NormalizationSetting::Disabled {
        return Ok(None);
    }

    let supported = match destination.definition_id {
        Some(definition_id) => {
            scope
                .destination_supports_normalization(definition_id)
                .await?
        }
        None => false,
    };

    if supported {
        if let Some(operation_id) = existing_operation_id {
            return Ok(Some(operation_id));
        }
        log::info!(
            "Creating normalization operation for destination '{}'",
            destination.entity.name
        );
        let operation = scope
            .client()
            .create_operation(&OperationCreate::basic_normalization(scope.workspace_id()))
            .await?;
        return Ok(Some(operation.operation_id));
    }

    match intent {
        NormalizationSetting::Enabled => Err(ReconcileError::NormalizationUnsupported {
            destination: destination.entity.name.clone(),
        }),
        _ => Ok(None),
    }
}
