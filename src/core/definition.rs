//! Built state machine definitions.
//!
//! An [`FsmDefinition`] is produced once per handler by
//! [`DefinitionBuilder`](crate::builder::DefinitionBuilder) and is immutable
//! afterwards. Dispatchers share it read-only through an `Arc`.

use super::entity::EntityId;
use super::guard::Guard;
use super::state::StateDef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Attempts per dispatch when a handler declares no retry policy.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 20;

/// Delay between attempts when a handler declares no retry policy.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 250;

/// Source state of a transition that applies from any state.
pub const ANY_STATE: &str = "*";

/// How often, and how far apart, a dispatch is attempted when its save
/// loses an optimistic-concurrency race.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub attempts: u32,
    /// Constant delay between attempts
    pub interval_ms: u64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, interval_ms: u64) -> Self {
        Self {
            attempts,
            interval_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS)
    }
}

/// What an action or guard knows about the transition being attempted.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionContext {
    pub entity_id: EntityId,
    pub event: String,
    pub from: String,
    pub to: String,
    /// 1-based dispatch attempt
    pub attempt: u32,
}

/// Failure reported by a transition action.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

type ActionFn = Arc<dyn Fn(&ActionContext, &Value) -> Result<Value, ActionError> + Send + Sync>;

/// Handler callable run while a transition fires.
///
/// The action receives the transition context and the call arguments and
/// returns the value handed back to the caller. It may run more than once
/// for a single dispatch when the save that follows it loses a race.
#[derive(Clone)]
pub struct Action {
    action: ActionFn,
}

impl Action {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&ActionContext, &Value) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
        }
    }

    pub fn invoke(&self, context: &ActionContext, args: &Value) -> Result<Value, ActionError> {
        (self.action)(context, args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

/// Where a transition may fire from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    State(String),
    /// Any non-blocking state
    Any,
}

impl Source {
    pub fn parse(from: &str) -> Self {
        if from == ANY_STATE {
            Source::Any
        } else {
            Source::State(from.to_string())
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::State(name) => f.write_str(name),
            Source::Any => f.write_str(ANY_STATE),
        }
    }
}

/// Where a transition leads.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    State(String),
    /// Stay in the current state; nothing is saved
    Current,
}

/// Split a `binder:event` declaration into its binder key and bare event.
///
/// Returns `None` for events without a binder prefix.
///
/// ```rust
/// use statekeeper::core::split_binder;
///
/// assert_eq!(split_binder("mock:/users/one"), Some(("mock", "/users/one")));
/// assert_eq!(split_binder("approve"), None);
/// ```
pub fn split_binder(event: &str) -> Option<(&str, &str)> {
    let (binder, bare) = event.split_once(':')?;
    let valid_key = !binder.is_empty()
        && binder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    (valid_key && !bare.is_empty()).then_some((binder, bare))
}

/// One event-triggered transition of a built definition.
#[derive(Clone, Debug)]
pub struct Transition {
    pub from: Source,
    pub event: String,
    pub to: Target,
    pub guard: Option<Guard>,
    pub action: Option<Action>,
}

impl Transition {
    /// The state an entity currently in `current` ends up in.
    pub fn target<'a>(&'a self, current: &'a str) -> &'a str {
        match &self.to {
            Target::State(name) => name.as_str(),
            Target::Current => current,
        }
    }

    /// Binder key of this transition's event, if it has one.
    pub fn binder(&self) -> Option<&str> {
        split_binder(&self.event).map(|(binder, _)| binder)
    }
}

/// Validated, immutable state machine of one handler.
#[derive(Clone, Debug)]
pub struct FsmDefinition {
    pub(crate) handler: String,
    pub(crate) namespace: Option<String>,
    pub(crate) states: Vec<StateDef>,
    pub(crate) initial: String,
    /// from state -> event -> transition
    pub(crate) transitions: HashMap<String, HashMap<String, Transition>>,
    /// event -> transition, applicable from any non-blocking state
    pub(crate) any_state: HashMap<String, Transition>,
    pub(crate) retry: RetryPolicy,
}

impl FsmDefinition {
    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Declared states, in declaration order.
    pub fn states(&self) -> &[StateDef] {
        &self.states
    }

    pub fn state(&self, name: &str) -> Option<&StateDef> {
        self.states.iter().find(|s| s.name() == name)
    }

    pub fn is_blocking(&self, name: &str) -> bool {
        self.state(name).is_some_and(StateDef::is_blocking)
    }

    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry.attempts
    }

    pub fn retry_interval_ms(&self) -> u64 {
        self.retry.interval_ms
    }

    /// Resolve the transition `event` triggers from `current`.
    ///
    /// A transition declared from `current` wins over a wildcard one.
    /// Wildcard transitions never fire from a blocking state.
    pub fn transition_for(&self, current: &str, event: &str) -> Option<&Transition> {
        if let Some(transition) = self
            .transitions
            .get(current)
            .and_then(|by_event| by_event.get(event))
        {
            return Some(transition);
        }
        if self.is_blocking(current) {
            return None;
        }
        self.any_state.get(event)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions
            .values()
            .flat_map(HashMap::values)
            .chain(self.any_state.values())
    }

    /// Every event name the definition reacts to, sorted.
    pub fn events(&self) -> BTreeSet<&str> {
        self.transitions().map(|t| t.event.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: Source, event: &str, to: Target) -> Transition {
        Transition {
            from,
            event: event.to_string(),
            to,
            guard: None,
            action: None,
        }
    }

    fn definition() -> FsmDefinition {
        let mut transitions: HashMap<String, HashMap<String, Transition>> = HashMap::new();
        transitions.entry("one".to_string()).or_default().insert(
            "next".to_string(),
            transition(
                Source::State("one".to_string()),
                "next",
                Target::State("two".to_string()),
            ),
        );
        transitions.entry("held".to_string()).or_default().insert(
            "release".to_string(),
            transition(
                Source::State("held".to_string()),
                "release",
                Target::State("one".to_string()),
            ),
        );

        let mut any_state = HashMap::new();
        any_state.insert(
            "hold".to_string(),
            transition(Source::Any, "hold", Target::State("held".to_string())),
        );
        any_state.insert(
            "touch".to_string(),
            transition(Source::Any, "touch", Target::Current),
        );

        FsmDefinition {
            handler: "widget".to_string(),
            namespace: None,
            states: vec![
                StateDef::new("one"),
                StateDef::new("two"),
                StateDef::new("held").blocking(),
            ],
            initial: "one".to_string(),
            transitions,
            any_state,
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 20);
        assert_eq!(policy.interval_ms, 250);
        assert_eq!(policy.interval(), Duration::from_millis(250));
    }

    #[test]
    fn exact_transition_resolves() {
        let def = definition();
        let t = def.transition_for("one", "next").unwrap();
        assert_eq!(t.target("one"), "two");
    }

    #[test]
    fn wildcard_applies_to_non_blocking_states() {
        let def = definition();
        assert!(def.transition_for("one", "hold").is_some());
        assert!(def.transition_for("two", "hold").is_some());
    }

    #[test]
    fn wildcard_never_leaves_blocking_state() {
        let def = definition();
        assert!(def.transition_for("held", "hold").is_none());
        assert!(def.transition_for("held", "touch").is_none());
        assert!(def.transition_for("held", "release").is_some());
    }

    #[test]
    fn stay_in_place_targets_current_state() {
        let def = definition();
        let t = def.transition_for("two", "touch").unwrap();
        assert_eq!(t.target("two"), "two");
    }

    #[test]
    fn missing_transition_is_none() {
        let def = definition();
        assert!(def.transition_for("two", "next").is_none());
        assert!(def.transition_for("unknown", "next").is_none());
    }

    #[test]
    fn events_are_collected() {
        let def = definition();
        let events: Vec<&str> = def.events().into_iter().collect();
        assert_eq!(events, vec!["hold", "next", "release", "touch"]);
    }

    #[test]
    fn split_binder_requires_key_and_event() {
        assert_eq!(split_binder("mock:/one"), Some(("mock", "/one")));
        assert_eq!(split_binder("spring-mvc:go"), Some(("spring-mvc", "go")));
        assert_eq!(split_binder(":go"), None);
        assert_eq!(split_binder("mock:"), None);
        assert_eq!(split_binder("a b:go"), None);
        assert_eq!(split_binder("go"), None);
    }
}
