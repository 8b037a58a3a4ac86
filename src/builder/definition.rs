//! Builder turning handler descriptors into validated definitions.

use crate::builder::error::{BuildError, DefinitionError};
use crate::core::{
    split_binder, FsmDefinition, ReferenceFactory, RetryPolicy, Source, StateDef, Target,
    Transition, ANY_STATE,
};
use crate::descriptor::HandlerDescriptor;
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

/// Validates one [`HandlerDescriptor`] and assembles its [`FsmDefinition`].
///
/// Validation does not stop at the first problem: every malformed
/// declaration is collected and reported together in
/// [`BuildError::InvalidDefinition`].
///
/// # Example
///
/// ```rust
/// use statekeeper::builder::DefinitionBuilder;
/// use statekeeper::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};
///
/// let descriptor = HandlerDescriptor::new("userController")
///     .state(StateDecl::new("one").initial())
///     .state(StateDecl::new("two"))
///     .transition(TransitionDecl::new("one", "next", "two"));
///
/// let definition = DefinitionBuilder::new(&descriptor).build().unwrap();
/// assert_eq!(definition.initial_state(), "one");
/// assert_eq!(definition.retry_attempts(), 20);
/// assert_eq!(definition.retry_interval_ms(), 250);
/// ```
pub struct DefinitionBuilder<'a> {
    descriptor: &'a HandlerDescriptor,
    default_retry: RetryPolicy,
}

impl<'a> DefinitionBuilder<'a> {
    pub fn new(descriptor: &'a HandlerDescriptor) -> Self {
        Self {
            descriptor,
            default_retry: RetryPolicy::default(),
        }
    }

    /// Retry policy applied when the descriptor declares none.
    pub fn default_retry(mut self, policy: RetryPolicy) -> Self {
        self.default_retry = policy;
        self
    }

    pub fn build(self) -> Result<FsmDefinition, BuildError> {
        let descriptor = self.descriptor;
        let mut checks: Vec<Check> = Vec::new();

        checks.push(require(
            !descriptor.name().is_empty(),
            DefinitionError::EmptyHandlerName,
        ));
        checks.push(require(
            ReferenceFactory::is_valid_segment(descriptor.name()),
            DefinitionError::InvalidHandlerName(descriptor.name().to_string()),
        ));
        if let Some(namespace) = descriptor.namespace_name() {
            checks.push(require(
                ReferenceFactory::is_valid_namespace(namespace),
                DefinitionError::InvalidNamespace(namespace.to_string()),
            ));
        }
        checks.push(require(
            !descriptor.declared_states().is_empty(),
            DefinitionError::NoStates,
        ));

        let mut declared: HashSet<&str> = HashSet::new();
        let mut states = Vec::new();
        for decl in descriptor.declared_states() {
            if decl.name.is_empty() {
                checks.push(Validation::fail(DefinitionError::EmptyStateName));
                continue;
            }
            if decl.name == ANY_STATE {
                checks.push(Validation::fail(DefinitionError::ReservedStateName(
                    decl.name.clone(),
                )));
                continue;
            }
            if !ReferenceFactory::is_valid_segment(&decl.name) {
                checks.push(Validation::fail(DefinitionError::InvalidStateName(
                    decl.name.clone(),
                )));
                continue;
            }
            if !declared.insert(decl.name.as_str()) {
                checks.push(Validation::fail(DefinitionError::DuplicateState(
                    decl.name.clone(),
                )));
                continue;
            }
            let state = StateDef::new(decl.name.as_str());
            states.push(if decl.blocking { state.blocking() } else { state });
        }

        let initials: Vec<String> = descriptor
            .declared_states()
            .iter()
            .filter(|s| s.initial)
            .map(|s| s.name.clone())
            .collect();
        if !descriptor.declared_states().is_empty() {
            checks.push(match initials.len() {
                0 => Validation::fail(DefinitionError::MissingInitialState),
                1 => Validation::success(()),
                _ => Validation::fail(DefinitionError::MultipleInitialStates(initials.clone())),
            });
        }

        let mut transitions: HashMap<String, HashMap<String, Transition>> = HashMap::new();
        let mut any_state: HashMap<String, Transition> = HashMap::new();
        for decl in descriptor.declared_transitions() {
            if decl.event.is_empty() {
                checks.push(Validation::fail(DefinitionError::EmptyEvent {
                    from: decl.from.clone(),
                }));
                continue;
            }
            if let Some((binder, _)) = split_binder(&decl.event) {
                checks.push(require(
                    ReferenceFactory::is_valid_binder_key(binder),
                    DefinitionError::ReservedBinderKey {
                        binder: binder.to_string(),
                        event: decl.event.clone(),
                    },
                ));
            }

            let from = Source::parse(&decl.from);
            if let Source::State(name) = &from {
                checks.push(declared_state(&declared, name, &decl.event));
            }
            let to = match &decl.to {
                Some(name) => {
                    checks.push(declared_state(&declared, name, &decl.event));
                    Target::State(name.clone())
                }
                None => Target::Current,
            };

            let slot = match &from {
                Source::State(name) => transitions.entry(name.clone()).or_default(),
                Source::Any => &mut any_state,
            };
            if slot.contains_key(&decl.event) {
                checks.push(Validation::fail(DefinitionError::DuplicateTransition {
                    from: from.to_string(),
                    event: decl.event.clone(),
                }));
                continue;
            }
            slot.insert(
                decl.event.clone(),
                Transition {
                    from,
                    event: decl.event.clone(),
                    to,
                    guard: decl.guard.clone(),
                    action: decl.action.clone(),
                },
            );
        }

        let retry = descriptor.retry_policy().unwrap_or(self.default_retry);
        checks.push(require(
            retry.attempts > 0,
            DefinitionError::ZeroRetryAttempts,
        ));

        let invalid = |violations: Vec<DefinitionError>| BuildError::InvalidDefinition {
            handler: descriptor.name().to_string(),
            violations,
        };

        match Validation::all_vec(checks) {
            Validation::Success(_) => {
                let Some(initial) = initials.into_iter().next() else {
                    return Err(invalid(vec![DefinitionError::MissingInitialState]));
                };
                tracing::debug!(
                    handler = descriptor.name(),
                    states = states.len(),
                    initial = %initial,
                    attempts = retry.attempts,
                    interval_ms = retry.interval_ms,
                    "built state machine definition"
                );
                Ok(FsmDefinition {
                    handler: descriptor.name().to_string(),
                    namespace: descriptor.namespace_name().map(str::to_string),
                    states,
                    initial,
                    transitions,
                    any_state,
                    retry,
                })
            }
            Validation::Failure(errors) => Err(invalid(errors.iter().cloned().collect())),
        }
    }
}

fn require(condition: bool, error: DefinitionError) -> Check {
    if condition {
        Validation::success(())
    } else {
        Validation::fail(error)
    }
}

fn declared_state(declared: &HashSet<&str>, state: &str, event: &str) -> Check {
    require(
        declared.contains(state),
        DefinitionError::UndeclaredState {
            state: state.to_string(),
            event: event.to_string(),
        },
    )
}
