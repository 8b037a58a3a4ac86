//! Dispatcher driving one handler's state machine.

use crate::core::{ActionContext, EntityId, FsmDefinition, Target};
use crate::dispatch::error::DispatchError;
use crate::persistence::{PersistError, Persister};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome of a single dispatch attempt
enum Attempt {
    Done(Value),
    Conflict,
}

/// Routes events for one handler through its state machine.
///
/// A dispatcher holds only shared references to an immutable definition
/// and a persister, so one instance serves any number of concurrent
/// callers. It takes no locks of its own: two dispatches racing on the same
/// entity are serialized by the persister's compare-and-set, and the loser
/// retries under the definition's [`RetryPolicy`](crate::core::RetryPolicy).
///
/// # Example
///
/// ```rust
/// use statekeeper::builder::DefinitionBuilder;
/// use statekeeper::core::EntityId;
/// use statekeeper::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
/// use statekeeper::dispatch::Dispatcher;
/// use statekeeper::persistence::MemoryPersister;
/// use serde_json::{json, Value};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let descriptor = HandlerDescriptor::new("doorController")
///     .state(StateDecl::new("closed").initial())
///     .state(StateDecl::new("open"))
///     .transition(
///         TransitionDecl::new("closed", "open", "open")
///             .with_action(|ctx, _args| Ok(json!({ "opened": ctx.entity_id }))),
///     );
/// let definition = Arc::new(DefinitionBuilder::new(&descriptor).build().unwrap());
/// let dispatcher = Dispatcher::new(definition, Arc::new(MemoryPersister::new()));
///
/// let door = EntityId::from("front");
/// dispatcher.create(&door).unwrap();
/// let reply = dispatcher.dispatch(&door, "open", Value::Null).await.unwrap();
///
/// assert_eq!(reply, json!({ "opened": "front" }));
/// assert_eq!(dispatcher.current_state(&door).unwrap(), "open");
/// # }
/// ```
pub struct Dispatcher {
    definition: Arc<FsmDefinition>,
    persister: Arc<dyn Persister>,
}

impl Dispatcher {
    pub fn new(definition: Arc<FsmDefinition>, persister: Arc<dyn Persister>) -> Self {
        Self {
            definition,
            persister,
        }
    }

    pub fn definition(&self) -> &Arc<FsmDefinition> {
        &self.definition
    }

    pub fn persister(&self) -> &Arc<dyn Persister> {
        &self.persister
    }

    /// Seed `entity_id` in the definition's initial state.
    pub fn create(&self, entity_id: &EntityId) -> Result<(), DispatchError> {
        self.persister
            .create(entity_id, self.definition.initial_state())?;
        Ok(())
    }

    pub fn current_state(&self, entity_id: &EntityId) -> Result<String, DispatchError> {
        Ok(self.persister.load(entity_id)?)
    }

    /// Deliver `event` to `entity_id`, returning the transition action's value.
    ///
    /// Unknown entities fail with [`DispatchError::NotFound`]; nothing is
    /// created implicitly. An event with no transition from the current
    /// state fails with [`DispatchError::NoSuchTransition`] and is not
    /// retried. When the save loses a race the whole attempt (load, resolve,
    /// action, save) is repeated after the policy's fixed interval, until the
    /// attempts run out. A transition without a target writes nothing but
    /// still verifies the state it started from, so it conflicts and retries
    /// the same way.
    ///
    /// Dropping the returned future, for example under
    /// `tokio::time::timeout`, cancels any pending retry.
    pub async fn dispatch(
        &self,
        entity_id: &EntityId,
        event: &str,
        args: Value,
    ) -> Result<Value, DispatchError> {
        let policy = self.definition.retry_policy();
        let mut attempt = 1;

        loop {
            match self.attempt(entity_id, event, &args, attempt)? {
                Attempt::Done(value) => return Ok(value),
                Attempt::Conflict if attempt >= policy.attempts => {
                    tracing::warn!(
                        handler = self.definition.handler(),
                        entity = %entity_id,
                        event,
                        attempts = attempt,
                        "giving up on conflicting dispatch"
                    );
                    return Err(DispatchError::RetryExhausted {
                        entity: entity_id.clone(),
                        attempts: attempt,
                    });
                }
                Attempt::Conflict => {
                    tracing::debug!(
                        handler = self.definition.handler(),
                        entity = %entity_id,
                        event,
                        attempt,
                        "concurrent modification, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(policy.interval()).await;
                }
            }
        }
    }

    fn attempt(
        &self,
        entity_id: &EntityId,
        event: &str,
        args: &Value,
        attempt: u32,
    ) -> Result<Attempt, DispatchError> {
        let current = self.persister.load(entity_id)?;

        let transition = self
            .definition
            .transition_for(&current, event)
            .ok_or_else(|| DispatchError::NoSuchTransition {
                state: current.clone(),
                event: event.to_string(),
            })?;
        let target = transition.target(&current).to_string();

        let context = ActionContext {
            entity_id: entity_id.clone(),
            event: event.to_string(),
            from: current.clone(),
            to: target.clone(),
            attempt,
        };

        if let Some(guard) = &transition.guard {
            if !guard.check(&context, args) {
                return Err(DispatchError::GuardRejected {
                    state: current,
                    event: event.to_string(),
                });
            }
        }

        let value = match &transition.action {
            Some(action) => action.invoke(&context, args)?,
            None => Value::Null,
        };

        let written = match transition.to {
            Target::Current => self.persister.verify(entity_id, &current),
            Target::State(_) => self.persister.save(entity_id, &current, &target),
        };

        match written {
            Ok(()) => Ok(Attempt::Done(value)),
            Err(PersistError::ConcurrentModification { .. }) => Ok(Attempt::Conflict),
            Err(err) => Err(err.into()),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler", &self.definition.handler())
            .field("persister", &self.persister.kind())
            .finish()
    }
}
