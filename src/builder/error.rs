//! Build errors for definitions and transitions.

use thiserror::Error;

/// One malformed declaration found while validating a handler descriptor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Handler name is empty")]
    EmptyHandlerName,

    #[error("Handler name '{0}' contains '.' or ':'")]
    InvalidHandlerName(String),

    #[error("Namespace '{0}' contains ':'")]
    InvalidNamespace(String),

    #[error("No states declared")]
    NoStates,

    #[error("State name is empty")]
    EmptyStateName,

    #[error("State name '{0}' contains '.' or ':'")]
    InvalidStateName(String),

    #[error("State name '{0}' is reserved")]
    ReservedStateName(String),

    #[error("State '{0}' is declared more than once")]
    DuplicateState(String),

    #[error("No initial state declared. Mark exactly one state with .initial()")]
    MissingInitialState,

    #[error("Multiple initial states declared: {}", .0.join(", "))]
    MultipleInitialStates(Vec<String>),

    #[error("Transition on '{event}' references undeclared state '{state}'")]
    UndeclaredState { state: String, event: String },

    #[error("Transition from '{from}' declares an empty event")]
    EmptyEvent { from: String },

    #[error("Event '{event}' uses reserved binder key '{binder}'")]
    ReservedBinderKey { binder: String, event: String },

    #[error("More than one transition from '{from}' on event '{event}'")]
    DuplicateTransition { from: String, event: String },

    #[error("Retry attempts must be at least 1")]
    ZeroRetryAttempts,
}

/// Errors that can occur when building definitions and transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition event not specified. Call .on(event)")]
    MissingEvent,

    #[error("Invalid definition for handler '{handler}': {}", render(.violations))]
    InvalidDefinition {
        handler: String,
        violations: Vec<DefinitionError>,
    },
}

impl BuildError {
    /// Violations behind an [`InvalidDefinition`](BuildError::InvalidDefinition).
    pub fn violations(&self) -> &[DefinitionError] {
        match self {
            BuildError::InvalidDefinition { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn render(violations: &[DefinitionError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
