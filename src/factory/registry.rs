//! Component and artifact registry.
//!
//! The registry is the boundary between the host application and the
//! factory. The host registers components (handler descriptors and entity
//! repositories) under logical names; the factory reads them and commits
//! the artifacts it builds under identifiers from
//! [`ReferenceFactory`](crate::core::ReferenceFactory). Transport adapters
//! then look artifacts up by those identifiers.

use crate::core::{FsmDefinition, ReferenceFactory, StateDef};
use crate::descriptor::HandlerDescriptor;
use crate::dispatch::{Binder, Dispatcher, Harness};
use crate::persistence::{Persister, PersisterFactory};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A persistence backend able to store entities of one type.
#[derive(Clone)]
pub struct RepositoryDefinition {
    entity: String,
    factory: Arc<dyn PersisterFactory>,
}

impl RepositoryDefinition {
    pub fn new(entity: impl Into<String>, factory: impl PersisterFactory + 'static) -> Self {
        Self {
            entity: entity.into(),
            factory: Arc::new(factory),
        }
    }

    /// Entity type this repository stores.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn factory(&self) -> &Arc<dyn PersisterFactory> {
        &self.factory
    }
}

impl fmt::Debug for RepositoryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryDefinition")
            .field("entity", &self.entity)
            .field("factory", &self.factory.kind())
            .finish()
    }
}

/// A declared component the factory may read.
#[derive(Clone, Debug)]
pub enum Component {
    Handler(HandlerDescriptor),
    Repository(RepositoryDefinition),
}

/// An artifact produced by the factory.
#[derive(Clone)]
pub enum Artifact {
    State(StateDef),
    Fsm(Arc<FsmDefinition>),
    Persister(Arc<dyn Persister>),
    Dispatcher(Arc<Dispatcher>),
    Binder(Arc<Binder>),
    Harness(Arc<Harness>),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::State(_) => "state",
            Artifact::Fsm(_) => "fsm",
            Artifact::Persister(_) => "persister",
            Artifact::Dispatcher(_) => "dispatcher",
            Artifact::Binder(_) => "binder",
            Artifact::Harness(_) => "harness",
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::State(state) => f.debug_tuple("State").field(state).finish(),
            Artifact::Fsm(definition) => {
                f.debug_tuple("Fsm").field(&definition.handler()).finish()
            }
            Artifact::Persister(persister) => {
                f.debug_tuple("Persister").field(&persister.kind()).finish()
            }
            Artifact::Dispatcher(dispatcher) => {
                f.debug_tuple("Dispatcher").field(dispatcher).finish()
            }
            Artifact::Binder(binder) => f.debug_tuple("Binder").field(&binder.key()).finish(),
            Artifact::Harness(_) => f.write_str("Harness"),
        }
    }
}

/// Named components in, identified artifacts out.
#[derive(Debug, Default)]
pub struct Registry {
    components: BTreeMap<String, Component>,
    artifacts: BTreeMap<String, Artifact>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, returning the one it replaced.
    pub fn register_component(
        &mut self,
        name: impl Into<String>,
        component: Component,
    ) -> Option<Component> {
        self.components.insert(name.into(), component)
    }

    /// Register a handler under its namespace-qualified name.
    pub fn register_handler(&mut self, descriptor: HandlerDescriptor) -> Option<Component> {
        let name = ReferenceFactory::with_namespace(descriptor.namespace_name(), descriptor.name())
            .root()
            .to_string();
        self.register_component(name, Component::Handler(descriptor))
    }

    pub fn register_repository(
        &mut self,
        name: impl Into<String>,
        repository: RepositoryDefinition,
    ) -> Option<Component> {
        self.register_component(name, Component::Repository(repository))
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.components.values().filter_map(|c| match c {
            Component::Handler(descriptor) => Some(descriptor),
            Component::Repository(_) => None,
        })
    }

    pub fn repositories(&self) -> impl Iterator<Item = (&str, &RepositoryDefinition)> {
        self.components.iter().filter_map(|(name, c)| match c {
            Component::Repository(repository) => Some((name.as_str(), repository)),
            Component::Handler(_) => None,
        })
    }

    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.artifacts.contains_key(id)
    }

    /// Identifiers of every registered artifact, sorted.
    pub fn artifact_ids(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    /// Number of registered artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn state(&self, id: &str) -> Option<&StateDef> {
        match self.artifact(id)? {
            Artifact::State(state) => Some(state),
            _ => None,
        }
    }

    pub fn fsm(&self, id: &str) -> Option<&Arc<FsmDefinition>> {
        match self.artifact(id)? {
            Artifact::Fsm(definition) => Some(definition),
            _ => None,
        }
    }

    pub fn persister(&self, id: &str) -> Option<&Arc<dyn Persister>> {
        match self.artifact(id)? {
            Artifact::Persister(persister) => Some(persister),
            _ => None,
        }
    }

    pub fn dispatcher(&self, id: &str) -> Option<&Arc<Dispatcher>> {
        match self.artifact(id)? {
            Artifact::Dispatcher(dispatcher) => Some(dispatcher),
            _ => None,
        }
    }

    pub fn binder(&self, id: &str) -> Option<&Arc<Binder>> {
        match self.artifact(id)? {
            Artifact::Binder(binder) => Some(binder),
            _ => None,
        }
    }

    pub fn harness(&self, id: &str) -> Option<&Arc<Harness>> {
        match self.artifact(id)? {
            Artifact::Harness(harness) => Some(harness),
            _ => None,
        }
    }

    /// Make one handler's artifacts visible together.
    pub(crate) fn commit(&mut self, entries: Vec<(String, Artifact)>) {
        self.artifacts.extend(entries);
    }
}
