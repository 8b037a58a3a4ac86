//! Construction engine.
//!
//! [`StatefulFactory`] turns the handler descriptors in a [`Registry`] into
//! runnable machinery. For every handler it:
//!
//! 1. resolves the persister factory (built-in memory or a registered
//!    repository for the handler's entity type)
//! 2. builds and validates the [`FsmDefinition`](crate::core::FsmDefinition)
//! 3. creates the persister and a [`Dispatcher`]
//! 4. registers the states, definition, persister, dispatcher, one
//!    [`Binder`] per binder key and, when requested, a [`Harness`]
//!
//! All of a handler's artifacts are committed together after every step
//! succeeded, so a failing handler leaves nothing behind. Running the
//! factory again over the same registry skips handlers that are already
//! constructed.
//!
//! # Example
//!
//! ```rust
//! use statekeeper::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
//! use statekeeper::factory::{Registry, StatefulFactory};
//!
//! let mut registry = Registry::new();
//! registry.register_handler(
//!     HandlerDescriptor::new("orderController")
//!         .state(StateDecl::new("open").initial())
//!         .state(StateDecl::new("closed"))
//!         .transition(TransitionDecl::new("open", "close", "closed")),
//! );
//!
//! let report = StatefulFactory::new().construct(&mut registry).unwrap();
//!
//! assert_eq!(report.built, vec!["orderController".to_string()]);
//! assert!(registry.dispatcher("orderController.dispatcher").is_some());
//! ```

use crate::builder::DefinitionBuilder;
use crate::config::FactoryConfig;
use crate::core::ReferenceFactory;
use crate::descriptor::{HandlerDescriptor, PersisterDecl};
use crate::dispatch::{Binder, Dispatcher, Harness};
use crate::persistence::{MemoryPersisterFactory, PersisterFactory};
use std::sync::Arc;

mod error;
mod registry;

pub use error::FactoryError;
pub use registry::{Artifact, Component, Registry, RepositoryDefinition};

/// Outcome of one [`StatefulFactory::construct`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructionReport {
    /// Roots of handlers constructed by this run.
    pub built: Vec<String>,
    /// Roots of handlers that were already constructed.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StatefulFactory {
    config: FactoryConfig,
}

impl StatefulFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// Restrict construction to handlers declared in `namespace`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Construct every in-scope handler registered in `registry`.
    ///
    /// Stops at the first handler that fails. Handlers constructed before
    /// it stay registered and usable.
    pub fn construct(&self, registry: &mut Registry) -> Result<ConstructionReport, FactoryError> {
        let descriptors: Vec<HandlerDescriptor> = registry
            .handlers()
            .filter(|descriptor| self.in_scope(descriptor))
            .cloned()
            .collect();

        let mut report = ConstructionReport::default();
        for descriptor in &descriptors {
            let refs =
                ReferenceFactory::with_namespace(descriptor.namespace_name(), descriptor.name());

            if already_constructed(registry, &refs)? {
                tracing::debug!(handler = refs.root(), "handler already constructed");
                report.skipped.push(refs.root().to_string());
                continue;
            }

            self.construct_handler(registry, descriptor)?;
            report.built.push(refs.root().to_string());
        }

        Ok(report)
    }

    /// Construct a single handler and commit its artifacts.
    ///
    /// A handler that is already constructed is left untouched.
    pub fn construct_handler(
        &self,
        registry: &mut Registry,
        descriptor: &HandlerDescriptor,
    ) -> Result<(), FactoryError> {
        let refs = ReferenceFactory::with_namespace(descriptor.namespace_name(), descriptor.name());
        if already_constructed(registry, &refs)? {
            return Ok(());
        }

        let entries = match self.assemble(registry, descriptor, &refs) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(handler = refs.root(), error = %err, "handler construction failed");
                return Err(err);
            }
        };

        let artifacts = entries.len();
        registry.commit(entries);
        tracing::info!(handler = refs.root(), artifacts, "handler constructed");
        Ok(())
    }

    fn in_scope(&self, descriptor: &HandlerDescriptor) -> bool {
        match self.config.namespace.as_deref() {
            None | Some("") => true,
            Some(namespace) => descriptor.namespace_name() == Some(namespace),
        }
    }

    fn assemble(
        &self,
        registry: &Registry,
        descriptor: &HandlerDescriptor,
        refs: &ReferenceFactory,
    ) -> Result<Vec<(String, Artifact)>, FactoryError> {
        let persister_factory = resolve_persister(registry, descriptor, refs)?;

        let definition = Arc::new(
            DefinitionBuilder::new(descriptor)
                .default_retry(self.config.retry_policy())
                .build()?,
        );

        let persister =
            persister_factory
                .create(&definition)
                .map_err(|source| FactoryError::Persister {
                    handler: refs.root().to_string(),
                    source,
                })?;

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&definition),
            Arc::clone(&persister),
        ));

        let mut entries: Vec<(String, Artifact)> = definition
            .states()
            .iter()
            .map(|state| (refs.state_id(state.name()), Artifact::State(state.clone())))
            .collect();

        entries.push((refs.fsm_id(), Artifact::Fsm(Arc::clone(&definition))));
        entries.push((refs.persister_id(), Artifact::Persister(persister)));
        entries.push((
            refs.dispatcher_id(),
            Artifact::Dispatcher(Arc::clone(&dispatcher)),
        ));

        for key in Binder::keys(&definition) {
            let binder = Binder::new(key, Arc::clone(&dispatcher));
            entries.push((refs.binder_id(key), Artifact::Binder(Arc::new(binder))));
        }

        if descriptor.wants_harness() {
            let harness = Harness::new(Arc::clone(&dispatcher));
            entries.push((refs.harness_id(), Artifact::Harness(Arc::new(harness))));
        }

        if let Some((id, _)) = entries.iter().find(|(id, _)| registry.contains(id)) {
            return Err(FactoryError::IdentifierCollision {
                handler: refs.root().to_string(),
                id: id.clone(),
            });
        }

        Ok(entries)
    }
}

/// Whether the handler behind `refs` is already registered.
///
/// Its fsm id must hold that same handler's definition; any other artifact
/// there is a collision.
fn already_constructed(registry: &Registry, refs: &ReferenceFactory) -> Result<bool, FactoryError> {
    match registry.artifact(&refs.fsm_id()) {
        None => Ok(false),
        Some(Artifact::Fsm(definition))
            if ReferenceFactory::with_namespace(definition.namespace(), definition.handler())
                == *refs =>
        {
            Ok(true)
        }
        Some(_) => Err(FactoryError::IdentifierCollision {
            handler: refs.root().to_string(),
            id: refs.fsm_id(),
        }),
    }
}

fn resolve_persister(
    registry: &Registry,
    descriptor: &HandlerDescriptor,
    refs: &ReferenceFactory,
) -> Result<Arc<dyn PersisterFactory>, FactoryError> {
    let entity = match descriptor.persister_decl() {
        PersisterDecl::Memory => return Ok(Arc::new(MemoryPersisterFactory)),
        PersisterDecl::Repository { entity } => entity,
    };

    let matches: Vec<(&str, &RepositoryDefinition)> = registry
        .repositories()
        .filter(|(_, repository)| repository.entity() == entity)
        .collect();

    match matches.as_slice() {
        [] => Err(FactoryError::UnresolvedPersister {
            handler: refs.root().to_string(),
            entity: entity.clone(),
        }),
        [(_, repository)] => Ok(Arc::clone(repository.factory())),
        many => Err(FactoryError::AmbiguousPersister {
            handler: refs.root().to_string(),
            entity: entity.clone(),
            repositories: many.iter().map(|(name, _)| name.to_string()).collect(),
        }),
    }
}
