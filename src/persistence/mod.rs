//! Entity state persistence with optimistic concurrency.
//!
//! A [`Persister`] stores the current state of every entity of one handler.
//! Writes are compare-and-set: a save names the state it expects to replace
//! and fails with [`PersistError::ConcurrentModification`] when another
//! writer got there first. Persisters never retry; resolving conflicts is
//! the dispatcher's job.

use crate::core::{EntityId, FsmDefinition};
use std::sync::Arc;

pub mod error;
pub mod memory;

pub use error::PersistError;
pub use memory::{MemoryPersister, MemoryPersisterFactory};

/// Storage for entity states.
///
/// Implementations must make [`save`](Persister::save) atomic with respect to
/// its compare: of two concurrent saves expecting the same state, exactly
/// one succeeds.
pub trait Persister: Send + Sync {
    /// Short backend name, e.g. `"memory"`.
    fn kind(&self) -> &str;

    /// Current state of `entity_id`.
    fn load(&self, entity_id: &EntityId) -> Result<String, PersistError>;

    /// Replace `expected` with `new_state`, failing if the stored state moved.
    fn save(&self, entity_id: &EntityId, expected: &str, new_state: &str)
        -> Result<(), PersistError>;

    /// Confirm `entity_id` is still in `expected` without writing.
    ///
    /// Fails with [`PersistError::ConcurrentModification`] when the stored
    /// state moved, like a [`save`](Persister::save) expecting `expected`
    /// would.
    fn verify(&self, entity_id: &EntityId, expected: &str) -> Result<(), PersistError> {
        let actual = self.load(entity_id)?;
        if actual == expected {
            Ok(())
        } else {
            Err(PersistError::ConcurrentModification {
                entity: entity_id.clone(),
                expected: expected.to_string(),
                actual,
            })
        }
    }

    /// Seed a new entity in `initial`.
    fn create(&self, entity_id: &EntityId, initial: &str) -> Result<(), PersistError>;
}

/// Creates the persister for one handler's definition.
///
/// Repositories registered with the factory carry one of these; the
/// built-in in-memory backend is [`MemoryPersisterFactory`].
pub trait PersisterFactory: Send + Sync {
    fn kind(&self) -> &str;

    fn create(&self, definition: &FsmDefinition) -> Result<Arc<dyn Persister>, PersistError>;
}
