//! Dispatch error types.

use crate::core::{ActionError, EntityId};
use crate::persistence::PersistError;
use thiserror::Error;

/// Errors returned to callers of a dispatch.
///
/// Concurrent-modification conflicts never appear here directly: the
/// dispatcher retries them and reports [`RetryExhausted`](Self::RetryExhausted)
/// once its attempts run out.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("Entity '{0}' not found")]
    NotFound(EntityId),

    #[error("No transition from state '{state}' on event '{event}'")]
    NoSuchTransition { state: String, event: String },

    #[error("Guard rejected transition from '{state}' on event '{event}'")]
    GuardRejected { state: String, event: String },

    #[error("Transition action failed: {0}")]
    Action(#[from] ActionError),

    #[error("Entity '{entity}' still conflicted after {attempts} attempts")]
    RetryExhausted { entity: EntityId, attempts: u32 },

    #[error("Binder '{binder}' does not expose event '{event}'")]
    UnboundEvent { binder: String, event: String },

    #[error(transparent)]
    Persistence(PersistError),
}

impl From<PersistError> for DispatchError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::NotFound(entity) => DispatchError::NotFound(entity),
            other => DispatchError::Persistence(other),
        }
    }
}
