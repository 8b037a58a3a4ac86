//! Statekeeper: declarative finite state machines for stateful entities
//!
//! Handlers declare their states and transitions as data. A
//! [`StatefulFactory`] validates those declarations once at startup and
//! registers the machinery that drives entities through them at runtime.
//! Every state change is a compare-and-set against a [`Persister`]; events
//! that lose a race are retried under the handler's retry policy.
//!
//! # Core Concepts
//!
//! - **Descriptor**: a handler's declared states, transitions and persistence
//! - **Definition**: the validated, immutable state machine built from it
//! - **Persister**: per-entity state storage with optimistic concurrency
//! - **Dispatcher**: load, transition, save, retry on conflict
//! - **Registry**: the host-facing table of components and artifacts, keyed
//!   by deterministic identifiers
//!
//! # Example
//!
//! ```rust
//! use statekeeper::core::EntityId;
//! use statekeeper::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
//! use statekeeper::factory::{Registry, StatefulFactory};
//! use serde_json::{json, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut registry = Registry::new();
//! registry.register_handler(
//!     HandlerDescriptor::new("userController")
//!         .state(StateDecl::new("one").initial())
//!         .state(StateDecl::new("two"))
//!         .transition(
//!             TransitionDecl::new("one", "next", "two")
//!                 .with_action(|ctx, _args| Ok(json!(format!("moved {}", ctx.entity_id)))),
//!         ),
//! );
//! StatefulFactory::new().construct(&mut registry).unwrap();
//!
//! let dispatcher = registry.dispatcher("userController.dispatcher").unwrap();
//! let user = EntityId::from("u-1");
//! dispatcher.create(&user).unwrap();
//!
//! let result = dispatcher.dispatch(&user, "next", Value::Null).await.unwrap();
//! assert_eq!(result, json!("moved u-1"));
//! assert_eq!(dispatcher.current_state(&user).unwrap(), "two");
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod descriptor;
pub mod dispatch;
pub mod factory;
pub mod persistence;

// Re-export commonly used types
pub use crate::core::{EntityId, FsmDefinition, ReferenceFactory, RetryPolicy, StateDef};
pub use builder::{BuildError, DefinitionBuilder};
pub use config::FactoryConfig;
pub use descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
pub use dispatch::{Binder, DispatchError, Dispatcher, Harness};
pub use factory::{FactoryError, Registry, StatefulFactory};
pub use persistence::{MemoryPersister, PersistError, Persister};
