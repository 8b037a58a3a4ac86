//! Guard predicates for controlling transitions.
//!
//! Guards are pure boolean functions evaluated by the dispatcher after a
//! transition has been resolved and before its action runs.

use super::definition::ActionContext;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&ActionContext, &Value) -> bool + Send + Sync>;

/// Pure predicate that decides whether a resolved transition may fire.
///
/// The predicate sees the transition context (entity, event, source and
/// target state) together with the call arguments.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::{ActionContext, EntityId, Guard};
/// use serde_json::json;
///
/// let positive = Guard::new(|_ctx: &ActionContext, args| {
///     args["amount"].as_i64().is_some_and(|n| n > 0)
/// });
///
/// let ctx = ActionContext {
///     entity_id: EntityId::from("order-1"),
///     event: "pay".to_string(),
///     from: "open".to_string(),
///     to: "paid".to_string(),
///     attempt: 1,
/// };
///
/// assert!(positive.check(&ctx, &json!({ "amount": 10 })));
/// assert!(!positive.check(&ctx, &json!({ "amount": -1 })));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Predicate,
}

impl Guard {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ActionContext, &Value) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, context: &ActionContext, args: &Value) -> bool {
        (self.predicate)(context, args)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
