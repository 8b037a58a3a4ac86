//! Core state machine types.
//!
//! This module contains the values every other layer shares:
//! - Deterministic artifact identifiers via [`ReferenceFactory`]
//! - States, guards and actions
//! - The immutable [`FsmDefinition`]
//! - Entity ids and persisted history
//!
//! Nothing in this module performs I/O.

mod definition;
mod entity;
mod guard;
mod history;
mod reference;
mod state;

pub use definition::{
    split_binder, Action, ActionContext, ActionError, FsmDefinition, RetryPolicy, Source, Target,
    Transition, ANY_STATE, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS,
};
pub use entity::EntityId;
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use reference::{ReferenceFactory, NAMESPACE_SEPARATOR, SEGMENT_SEPARATOR};
pub use state::StateDef;
