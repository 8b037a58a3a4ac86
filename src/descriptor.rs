//! Handler descriptors.
//!
//! A [`HandlerDescriptor`] is the declared shape of one handler's state
//! machine, materialized from whatever metadata the host application uses.
//! Descriptors are plain values: they are only read while the factory
//! builds definitions and are never consulted at dispatch time.

use crate::core::{Action, ActionContext, ActionError, Guard, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declared state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDecl {
    pub name: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub blocking: bool,
}

impl StateDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: false,
            blocking: false,
        }
    }

    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

/// A declared transition.
///
/// `from` is a state name or `"*"` for any state. An absent `to` keeps the
/// entity where it is. Events may carry a binder prefix (`"mock:/one"`).
#[derive(Clone, Debug)]
pub struct TransitionDecl {
    pub from: String,
    pub event: String,
    pub to: Option<String>,
    pub guard: Option<Guard>,
    pub action: Option<Action>,
}

impl TransitionDecl {
    pub fn new(from: impl Into<String>, event: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            event: event.into(),
            to: Some(to.into()),
            guard: None,
            action: None,
        }
    }

    /// A transition that leaves the entity in its current state.
    pub fn stay(from: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            event: event.into(),
            to: None,
            guard: None,
            action: None,
        }
    }

    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&ActionContext, &Value) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        self.action = Some(Action::new(action));
        self
    }

    pub fn with_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&ActionContext, &Value) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(guard));
        self
    }
}

/// Where a handler's entity state lives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersisterDecl {
    /// The built-in in-memory persister
    #[default]
    Memory,
    /// A registered repository for `entity`
    Repository { entity: String },
}

/// Declared state machine shape of one handler.
///
/// # Example
///
/// ```rust
/// use statekeeper::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
///
/// let descriptor = HandlerDescriptor::new("orderController")
///     .state(StateDecl::new("open").initial())
///     .state(StateDecl::new("paid"))
///     .state(StateDecl::new("rejected").blocking())
///     .transition(TransitionDecl::new("open", "http:/orders/pay", "paid"))
///     .transition(TransitionDecl::new("*", "reject", "rejected"));
///
/// assert_eq!(descriptor.name(), "orderController");
/// assert!(descriptor.retry_policy().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct HandlerDescriptor {
    name: String,
    namespace: Option<String>,
    states: Vec<StateDecl>,
    transitions: Vec<TransitionDecl>,
    retry: Option<RetryPolicy>,
    persister: PersisterDecl,
    harness: bool,
}

impl HandlerDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            states: Vec::new(),
            transitions: Vec::new(),
            retry: None,
            persister: PersisterDecl::Memory,
            harness: false,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn state(mut self, state: StateDecl) -> Self {
        self.states.push(state);
        self
    }

    pub fn transition(mut self, transition: TransitionDecl) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn transitions(mut self, transitions: impl IntoIterator<Item = TransitionDecl>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Override the retry policy instead of taking the factory defaults.
    pub fn retry(mut self, attempts: u32, interval_ms: u64) -> Self {
        self.retry = Some(RetryPolicy::new(attempts, interval_ms));
        self
    }

    pub fn persister(mut self, persister: PersisterDecl) -> Self {
        self.persister = persister;
        self
    }

    /// Persist entities through the repository registered for `entity`.
    pub fn repository(self, entity: impl Into<String>) -> Self {
        self.persister(PersisterDecl::Repository {
            entity: entity.into(),
        })
    }

    /// Request a harness that creates unknown entities on first event.
    pub fn with_harness(mut self) -> Self {
        self.harness = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn declared_states(&self) -> &[StateDecl] {
        &self.states
    }

    pub fn declared_transitions(&self) -> &[TransitionDecl] {
        &self.transitions
    }

    /// Declared retry policy; `None` means "use the defaults".
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry
    }

    pub fn persister_decl(&self) -> &PersisterDecl {
        &self.persister
    }

    pub fn wants_harness(&self) -> bool {
        self.harness
    }
}
