//! In-memory persister.

use super::{PersistError, Persister, PersisterFactory};
use crate::core::{EntityId, FsmDefinition, StateHistory, StateTransition};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Record {
    state: String,
    version: u64,
    history: StateHistory,
}

/// Thread-safe in-memory entity store.
///
/// Each entity maps to its current state and a version counter bumped on
/// every successful save. The compare and the write of a save happen under
/// a single `parking_lot` write lock that is never held across an `.await`.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::EntityId;
/// use statekeeper::persistence::{MemoryPersister, PersistError, Persister};
///
/// let persister = MemoryPersister::new();
/// let id = EntityId::from("user-1");
/// persister.create(&id, "one").unwrap();
///
/// persister.save(&id, "one", "two").unwrap();
/// assert_eq!(persister.load(&id).unwrap(), "two");
///
/// // A writer still expecting "one" loses.
/// assert!(matches!(
///     persister.save(&id, "one", "three"),
///     Err(PersistError::ConcurrentModification { .. })
/// ));
/// ```
#[derive(Debug, Default)]
pub struct MemoryPersister {
    records: RwLock<HashMap<EntityId, Record>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves for `entity_id`.
    pub fn version(&self, entity_id: &EntityId) -> Option<u64> {
        self.records.read().get(entity_id).map(|r| r.version)
    }

    /// Persisted state changes of `entity_id`, oldest first.
    pub fn history(&self, entity_id: &EntityId) -> Option<StateHistory> {
        self.records.read().get(entity_id).map(|r| r.history.clone())
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Persister for MemoryPersister {
    fn kind(&self) -> &str {
        "memory"
    }

    fn load(&self, entity_id: &EntityId) -> Result<String, PersistError> {
        self.records
            .read()
            .get(entity_id)
            .map(|r| r.state.clone())
            .ok_or_else(|| PersistError::NotFound(entity_id.clone()))
    }

    fn save(
        &self,
        entity_id: &EntityId,
        expected: &str,
        new_state: &str,
    ) -> Result<(), PersistError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(entity_id)
            .ok_or_else(|| PersistError::NotFound(entity_id.clone()))?;

        if record.state != expected {
            return Err(PersistError::ConcurrentModification {
                entity: entity_id.clone(),
                expected: expected.to_string(),
                actual: record.state.clone(),
            });
        }

        let from = std::mem::replace(&mut record.state, new_state.to_string());
        record.version += 1;
        record.history = record.history.record(StateTransition {
            from,
            to: new_state.to_string(),
            version: record.version,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn create(&self, entity_id: &EntityId, initial: &str) -> Result<(), PersistError> {
        let mut records = self.records.write();
        if records.contains_key(entity_id) {
            return Err(PersistError::AlreadyExists(entity_id.clone()));
        }
        records.insert(
            entity_id.clone(),
            Record {
                state: initial.to_string(),
                version: 0,
                history: StateHistory::new(),
            },
        );
        Ok(())
    }
}

/// Builds one fresh [`MemoryPersister`] per handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryPersisterFactory;

impl PersisterFactory for MemoryPersisterFactory {
    fn kind(&self) -> &str {
        "memory"
    }

    fn create(&self, definition: &FsmDefinition) -> Result<Arc<dyn Persister>, PersistError> {
        tracing::debug!(handler = definition.handler(), "creating in-memory persister");
        Ok(Arc::new(MemoryPersister::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn seeded(id: &str, state: &str) -> (MemoryPersister, EntityId) {
        let persister = MemoryPersister::new();
        let id = EntityId::from(id);
        persister.create(&id, state).unwrap();
        (persister, id)
    }

    #[test]
    fn load_unknown_entity_is_not_found() {
        let persister = MemoryPersister::new();
        let id = EntityId::from("ghost");

        assert_eq!(persister.load(&id), Err(PersistError::NotFound(id)));
    }

    #[test]
    fn save_unknown_entity_is_not_found() {
        let persister = MemoryPersister::new();
        let id = EntityId::from("ghost");

        assert_eq!(
            persister.save(&id, "one", "two"),
            Err(PersistError::NotFound(id))
        );
    }

    #[test]
    fn create_twice_fails() {
        let (persister, id) = seeded("e", "one");
        assert_eq!(
            persister.create(&id, "one"),
            Err(PersistError::AlreadyExists(id.clone()))
        );
        assert_eq!(persister.len(), 1);
    }

    #[test]
    fn save_with_matching_expectation_succeeds() {
        let (persister, id) = seeded("e", "one");

        persister.save(&id, "one", "two").unwrap();

        assert_eq!(persister.load(&id).unwrap(), "two");
        assert_eq!(persister.version(&id), Some(1));
    }

    #[test]
    fn stale_save_is_rejected_and_state_kept() {
        let (persister, id) = seeded("e", "one");
        persister.save(&id, "one", "two").unwrap();

        let err = persister.save(&id, "one", "three").unwrap_err();

        assert_eq!(
            err,
            PersistError::ConcurrentModification {
                entity: id.clone(),
                expected: "one".to_string(),
                actual: "two".to_string(),
            }
        );
        assert_eq!(persister.load(&id).unwrap(), "two");
        assert_eq!(persister.version(&id), Some(1));
    }

    #[test]
    fn history_records_every_save() {
        let (persister, id) = seeded("e", "one");
        persister.save(&id, "one", "two").unwrap();
        persister.save(&id, "two", "three").unwrap();

        let history = persister.history(&id).unwrap();
        assert_eq!(history.get_path(), vec!["one", "two", "three"]);
        assert_eq!(history.transitions()[1].version, 2);
    }

    #[test]
    fn concurrent_saves_have_single_winner() {
        let persister = Arc::new(MemoryPersister::new());
        let id = EntityId::from("contested");
        persister.create(&id, "one").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let persister = Arc::clone(&persister);
                let id = id.clone();
                thread::spawn(move || persister.save(&id, "one", &format!("winner-{i}")).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(persister.version(&id), Some(1));
        assert!(persister.load(&id).unwrap().starts_with("winner-"));
    }

    #[test]
    fn entities_are_independent() {
        let persister = MemoryPersister::new();
        let a = EntityId::from("a");
        let b = EntityId::from("b");
        persister.create(&a, "one").unwrap();
        persister.create(&b, "one").unwrap();

        persister.save(&a, "one", "two").unwrap();

        assert_eq!(persister.load(&a).unwrap(), "two");
        assert_eq!(persister.load(&b).unwrap(), "one");
    }

    #[test]
    fn verify_checks_without_writing() {
        let (persister, id) = seeded("e", "one");

        persister.verify(&id, "one").unwrap();
        assert_eq!(persister.version(&id), Some(0));

        persister.save(&id, "one", "two").unwrap();
        assert!(matches!(
            persister.verify(&id, "one"),
            Err(PersistError::ConcurrentModification { ref actual, .. }) if actual == "two"
        ));
        assert_eq!(
            persister.verify(&EntityId::from("ghost"), "one"),
            Err(PersistError::NotFound(EntityId::from("ghost")))
        );
    }
}
