//! Transport-facing binders.

use crate::core::{split_binder, EntityId, FsmDefinition};
use crate::dispatch::{DispatchError, Dispatcher};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Dispatch endpoint for the events one binder key exposes.
///
/// Events declared as `key:event` belong to the binder `key`. A transport
/// adapter looks its binder up by [`binder_id`](crate::core::ReferenceFactory::binder_id)
/// and dispatches bare event names; events of other binders, and internal
/// events without a prefix, are not reachable through it.
#[derive(Debug)]
pub struct Binder {
    key: String,
    /// bare event -> declared event
    events: BTreeMap<String, String>,
    dispatcher: Arc<Dispatcher>,
}

impl Binder {
    pub fn new(key: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        let key = key.into();
        let events = dispatcher
            .definition()
            .events()
            .into_iter()
            .filter_map(|declared| {
                split_binder(declared)
                    .filter(|(binder, _)| *binder == key)
                    .map(|(_, bare)| (bare.to_string(), declared.to_string()))
            })
            .collect();
        Self {
            key,
            events,
            dispatcher,
        }
    }

    /// Binder keys used by a definition's events.
    pub fn keys(definition: &FsmDefinition) -> BTreeSet<&str> {
        definition
            .events()
            .into_iter()
            .filter_map(|event| split_binder(event).map(|(binder, _)| binder))
            .collect()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bare names of the events this binder exposes.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn handles(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Dispatch the bare `event` to `entity_id`.
    pub async fn dispatch(
        &self,
        entity_id: &EntityId,
        event: &str,
        args: Value,
    ) -> Result<Value, DispatchError> {
        let declared = self
            .events
            .get(event)
            .ok_or_else(|| DispatchError::UnboundEvent {
                binder: self.key.clone(),
                event: event.to_string(),
            })?;
        self.dispatcher.dispatch(entity_id, declared, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DefinitionBuilder;
    use crate::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
    use crate::persistence::MemoryPersister;

    fn dispatcher() -> Arc<Dispatcher> {
        let descriptor = HandlerDescriptor::new("userController")
            .state(StateDecl::new("one").initial())
            .state(StateDecl::new("two"))
            .state(StateDecl::new("three"))
            .transition(TransitionDecl::new("one", "mock:/one/two", "two"))
            .transition(TransitionDecl::new("two", "http:/two/three", "three"))
            .transition(TransitionDecl::new("three", "internal", "one"));
        let definition = Arc::new(DefinitionBuilder::new(&descriptor).build().unwrap());
        Arc::new(Dispatcher::new(definition, Arc::new(MemoryPersister::new())))
    }

    #[test]
    fn keys_collects_prefixed_events_only() {
        let dispatcher = dispatcher();
        let keys: Vec<&str> = Binder::keys(dispatcher.definition()).into_iter().collect();
        assert_eq!(keys, vec!["http", "mock"]);
    }

    #[test]
    fn binder_exposes_only_its_events() {
        let binder = Binder::new("mock", dispatcher());

        assert_eq!(binder.key(), "mock");
        assert_eq!(binder.events().collect::<Vec<_>>(), vec!["/one/two"]);
        assert!(binder.handles("/one/two"));
        assert!(!binder.handles("/two/three"));
        assert!(!binder.handles("internal"));
    }

    #[tokio::test]
    async fn binder_dispatches_bare_event() {
        let binder = Binder::new("mock", dispatcher());
        let id = EntityId::from("u-1");
        binder.dispatcher().create(&id).unwrap();

        binder.dispatch(&id, "/one/two", Value::Null).await.unwrap();

        assert_eq!(binder.dispatcher().current_state(&id).unwrap(), "two");
    }

    #[tokio::test]
    async fn foreign_event_is_unbound() {
        let binder = Binder::new("mock", dispatcher());
        let id = EntityId::from("u-1");
        binder.dispatcher().create(&id).unwrap();

        let err = binder.dispatch(&id, "internal", Value::Null).await;

        assert_eq!(
            err,
            Err(DispatchError::UnboundEvent {
                binder: "mock".to_string(),
                event: "internal".to_string(),
            })
        );
        assert_eq!(binder.dispatcher().current_state(&id).unwrap(), "one");
    }
}
