//! Builders for transitions and state machine definitions.
//!
//! [`TransitionBuilder`] declares transitions fluently; [`DefinitionBuilder`]
//! validates a whole [`HandlerDescriptor`](crate::descriptor::HandlerDescriptor)
//! and produces the immutable [`FsmDefinition`](crate::core::FsmDefinition).

pub mod definition;
pub mod error;
pub mod transition;

pub use definition::DefinitionBuilder;
pub use error::{BuildError, DefinitionError};
pub use transition::TransitionBuilder;
