//! Builder for declaring transitions.

use crate::builder::error::BuildError;
use crate::core::{Action, ActionContext, ActionError, Guard, ANY_STATE};
use crate::descriptor::TransitionDecl;
use serde_json::Value;

/// Builder for declaring transitions with a fluent API.
///
/// # Example
///
/// ```rust
/// use statekeeper::builder::TransitionBuilder;
/// use serde_json::json;
///
/// let transition = TransitionBuilder::new()
///     .from("one")
///     .on("mock:/users/two")
///     .to("two")
///     .action(|ctx, _args| Ok(json!({ "moved_to": ctx.to })))
///     .build()
///     .unwrap();
///
/// assert_eq!(transition.to.as_deref(), Some("two"));
/// ```
pub struct TransitionBuilder {
    from: Option<String>,
    event: Option<String>,
    to: Option<String>,
    guard: Option<Guard>,
    action: Option<Action>,
}

impl TransitionBuilder {
    pub fn new() -> Self {
        Self {
            from: None,
            event: None,
            to: None,
            guard: None,
            action: None,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: impl Into<String>) -> Self {
        self.from = Some(state.into());
        self
    }

    /// Fire from any non-blocking state.
    pub fn from_any(self) -> Self {
        self.from(ANY_STATE)
    }

    /// Set the triggering event (required).
    pub fn on(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the target state. Without one the entity stays where it is.
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.to = Some(state.into());
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ActionContext, &Value) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&ActionContext, &Value) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        self.action = Some(Action::new(action));
        self
    }

    pub fn build(self) -> Result<TransitionDecl, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let event = self.event.ok_or(BuildError::MissingEvent)?;

        Ok(TransitionDecl {
            from,
            event,
            to: self.to,
            guard: self.guard,
            action: self.action,
        })
    }
}

impl Default for TransitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
