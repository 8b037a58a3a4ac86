//! State definitions owned by a built state machine.

use serde::{Deserialize, Serialize};

/// One state of a handler's state machine.
///
/// States are identified by name, unique within their machine. A blocking
/// state is a held state: the dispatcher only lets an entity leave it through
/// a transition declared explicitly from that state, never through a
/// wildcard transition.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::StateDef;
///
/// let rejected = StateDef::new("rejected").blocking();
/// assert_eq!(rejected.name(), "rejected");
/// assert!(rejected.is_blocking());
/// assert!(!StateDef::new("active").is_blocking());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDef {
    name: String,
    #[serde(default)]
    blocking: bool,
}

impl StateDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocking: false,
        }
    }

    /// Mark this state as blocking.
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}
