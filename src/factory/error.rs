//! Construction errors.

use crate::builder::BuildError;
use crate::persistence::PersistError;
use thiserror::Error;

/// Fatal failure while constructing a handler.
///
/// The handler's artifacts are never partially registered: when one of
/// these is returned nothing of that handler is in the registry.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error(transparent)]
    InvalidDefinition(#[from] BuildError),

    #[error("Handler '{handler}' persists '{entity}' but no repository for it is registered")]
    UnresolvedPersister { handler: String, entity: String },

    #[error(
        "Handler '{handler}' persists '{entity}' but several repositories match: {}",
        .repositories.join(", ")
    )]
    AmbiguousPersister {
        handler: String,
        entity: String,
        repositories: Vec<String>,
    },

    #[error("Identifier '{id}' of handler '{handler}' is already taken by another artifact")]
    IdentifierCollision { handler: String, id: String },

    #[error("Persister for handler '{handler}' could not be created: {source}")]
    Persister {
        handler: String,
        #[source]
        source: PersistError,
    },
}
