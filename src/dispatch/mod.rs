//! Dispatch layer: the only entry point for events at runtime.
//!
//! - [`Dispatcher`] drives one handler's definition against its persister
//!   and owns the optimistic-concurrency retry loop
//! - [`Binder`] exposes the events of one binder key to a transport adapter
//! - [`Harness`] creates unknown entities before dispatching

mod binder;
mod dispatcher;
mod error;
mod harness;

pub use binder::Binder;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use harness::Harness;
