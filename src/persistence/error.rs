//! Persistence error types.

use crate::core::EntityId;
use thiserror::Error;

/// Errors a [`Persister`](super::Persister) may report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistError {
    /// The entity has never been created
    #[error("Entity '{0}' not found")]
    NotFound(EntityId),

    /// The stored state no longer matches the expected one
    #[error(
        "Entity '{entity}' was modified concurrently (expected '{expected}', found '{actual}')"
    )]
    ConcurrentModification {
        entity: EntityId,
        expected: String,
        actual: String,
    },

    #[error("Entity '{0}' already exists")]
    AlreadyExists(EntityId),

    /// Failure inside an alternative backend
    #[error("Persistence backend failed: {0}")]
    Backend(String),
}
