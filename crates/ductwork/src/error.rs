use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::reconcile::ReconcileError;

#[derive(Error, Debug)]
pub enum DuctworkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),
}

pub type Result<T> = std::result::Result<T, DuctworkError>;
