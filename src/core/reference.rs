//! Deterministic identifiers for constructed artifacts.
//!
//! Every artifact the factory registers (states, definitions, persisters,
//! dispatchers, binders, harnesses) is keyed by an identifier derived here.
//! Nothing else in the crate builds registry keys by hand, so a transport
//! adapter holding only a handler name can always find what it needs.

use std::fmt;

/// Separates a namespace qualifier from the handler name.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Separates the segments appended to a handler's root.
pub const SEGMENT_SEPARATOR: char = '.';

/// Segment preceding state names in state identifiers.
const STATE_SEGMENT: &str = "state";

/// Derives registry identifiers for one handler.
///
/// Identifiers are pure functions of the handler name and the optional
/// namespace: equal inputs always produce equal keys, and the same handler
/// name under two different namespaces never collides.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::ReferenceFactory;
///
/// let refs = ReferenceFactory::new("userController");
/// assert_eq!(refs.fsm_id(), "userController.fsm");
/// assert_eq!(refs.state_id("five"), "userController.state.five");
/// assert_eq!(refs.binder_id("mock"), "userController.mock.binder");
///
/// let alt = ReferenceFactory::with_namespace(Some("org.alternative"), "userController");
/// assert_ne!(refs.fsm_id(), alt.fsm_id());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceFactory {
    root: String,
}

impl ReferenceFactory {
    /// Identifiers for a handler in the default (unqualified) namespace.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            root: handler.into(),
        }
    }

    /// Identifiers for a handler, qualified by `namespace` when one is given.
    ///
    /// An empty namespace is the default namespace.
    pub fn with_namespace(namespace: Option<&str>, handler: impl Into<String>) -> Self {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => Self {
                root: format!("{ns}{NAMESPACE_SEPARATOR}{}", handler.into()),
            },
            None => Self::new(handler),
        }
    }

    /// Whether `name` can be a handler, state or binder segment.
    ///
    /// Segments carry neither separator, so distinct inputs never derive the
    /// same identifier.
    pub fn is_valid_segment(name: &str) -> bool {
        !name.contains([NAMESPACE_SEPARATOR, SEGMENT_SEPARATOR])
    }

    /// Whether `namespace` can qualify a handler. Dots are allowed
    /// (`org.alternative`); the namespace separator is not.
    pub fn is_valid_namespace(namespace: &str) -> bool {
        !namespace.contains(NAMESPACE_SEPARATOR)
    }

    /// Whether `binder` can be used as a binder key.
    ///
    /// `state` is reserved: `{root}.state.binder` is the id of a state named
    /// `binder`.
    pub fn is_valid_binder_key(binder: &str) -> bool {
        Self::is_valid_segment(binder) && binder != STATE_SEGMENT
    }

    /// The qualified handler name every identifier starts with.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn state_id(&self, state: &str) -> String {
        format!("{}.{STATE_SEGMENT}.{state}", self.root)
    }

    pub fn fsm_id(&self) -> String {
        format!("{}.fsm", self.root)
    }

    pub fn persister_id(&self) -> String {
        format!("{}.persister", self.root)
    }

    pub fn dispatcher_id(&self) -> String {
        format!("{}.dispatcher", self.root)
    }

    /// Identifier of the transport-facing binder for `binder` (e.g. `"mock"`).
    pub fn binder_id(&self, binder: &str) -> String {
        format!("{}.{binder}.binder", self.root)
    }

    pub fn harness_id(&self) -> String {
        format!("{}.harness", self.root)
    }
}

impl fmt::Display for ReferenceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)
    }
}
