//! Entity-creating dispatch front.

use crate::core::EntityId;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::persistence::PersistError;
use serde_json::Value;
use std::sync::Arc;

/// Dispatches events, creating entities the persister does not know yet.
///
/// Only registered for handlers that ask for one. Without a harness an
/// event for an unknown entity fails with [`DispatchError::NotFound`].
#[derive(Debug)]
pub struct Harness {
    dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Dispatch `event`, first creating the entity in the initial state if
    /// needed. Without an id a fresh one is generated.
    ///
    /// Returns the entity id alongside the action's value.
    pub async fn on_event(
        &self,
        entity_id: Option<EntityId>,
        event: &str,
        args: Value,
    ) -> Result<(EntityId, Value), DispatchError> {
        let entity_id = entity_id.unwrap_or_else(EntityId::generate);
        let definition = self.dispatcher.definition();

        match self
            .dispatcher
            .persister()
            .create(&entity_id, definition.initial_state())
        {
            Ok(()) => tracing::debug!(
                handler = definition.handler(),
                entity = %entity_id,
                "harness created entity"
            ),
            Err(PersistError::AlreadyExists(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let value = self.dispatcher.dispatch(&entity_id, event, args).await?;
        Ok((entity_id, value))
    }
}
