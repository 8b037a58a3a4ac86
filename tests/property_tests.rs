//! Property-based tests for identifiers, definitions and history.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use proptest::prelude::*;
use statekeeper::builder::DefinitionBuilder;
use statekeeper::core::{ReferenceFactory, StateHistory, StateTransition};
use statekeeper::descriptor::{HandlerDescriptor, StateDecl, TransitionDecl};

prop_compose! {
    fn handler_name()(name in "[a-z][A-Za-z0-9]{0,15}") -> String {
        name
    }
}

prop_compose! {
    fn namespace()(name in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}") -> String {
        name
    }
}

prop_compose! {
    fn state_names()(names in prop::collection::btree_set("[a-z]{1,6}", 1..8)) -> Vec<String> {
        names.into_iter().collect()
    }
}

fn chain(name: &str, states: &[String]) -> HandlerDescriptor {
    let mut descriptor = HandlerDescriptor::new(name);
    for (i, state) in states.iter().enumerate() {
        let decl = StateDecl::new(state.as_str());
        descriptor = descriptor.state(if i == 0 { decl.initial() } else { decl });
    }
    for pair in states.windows(2) {
        descriptor = descriptor.transition(TransitionDecl::new(
            pair[0].as_str(),
            format!("to_{}", pair[1]),
            pair[1].as_str(),
        ));
    }
    descriptor
}

proptest! {
    #[test]
    fn identifiers_are_deterministic(handler in handler_name(), state in "[a-z]{1,6}") {
        let a = ReferenceFactory::new(handler.clone());
        let b = ReferenceFactory::new(handler);
        prop_assert_eq!(a.fsm_id(), b.fsm_id());
        prop_assert_eq!(a.state_id(&state), b.state_id(&state));
        prop_assert_eq!(a.binder_id("mock"), b.binder_id("mock"));
    }

    #[test]
    fn identifiers_are_distinct_per_artifact(handler in handler_name()) {
        let refs = ReferenceFactory::new(handler);
        let mut ids = vec![
            refs.fsm_id(),
            refs.persister_id(),
            refs.dispatcher_id(),
            refs.harness_id(),
            refs.state_id("one"),
            refs.binder_id("mock"),
        ];
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), 6);
    }

    #[test]
    fn namespaces_never_collide(
        handler in handler_name(),
        first in namespace(),
        second in namespace(),
    ) {
        prop_assume!(first != second);
        let a = ReferenceFactory::with_namespace(Some(&first), handler.clone());
        let b = ReferenceFactory::with_namespace(Some(&second), handler.clone());
        let plain = ReferenceFactory::new(handler);

        prop_assert_ne!(a.fsm_id(), b.fsm_id());
        prop_assert_ne!(a.fsm_id(), plain.fsm_id());
    }

    #[test]
    fn undeclared_retry_uses_defaults(handler in handler_name(), states in state_names()) {
        let definition = DefinitionBuilder::new(&chain(&handler, &states)).build().unwrap();

        prop_assert_eq!(definition.retry_attempts(), 20);
        prop_assert_eq!(definition.retry_interval_ms(), 250);
        prop_assert_eq!(definition.initial_state(), states[0].as_str());
    }

    #[test]
    fn declared_retry_is_kept(attempts in 1u32..1000, interval in 1u64..10_000) {
        let states = vec!["a".to_string(), "b".to_string()];
        let descriptor = chain("h", &states).retry(attempts, interval);
        let definition = DefinitionBuilder::new(&descriptor).build().unwrap();

        prop_assert_eq!(definition.retry_attempts(), attempts);
        prop_assert_eq!(definition.retry_interval_ms(), interval);
    }

    #[test]
    fn chain_transitions_resolve(states in state_names()) {
        let definition = DefinitionBuilder::new(&chain("h", &states)).build().unwrap();

        for pair in states.windows(2) {
            let event = format!("to_{}", pair[1]);
            let transition = definition.transition_for(&pair[0], &event);
            prop_assert!(transition.is_some());
            prop_assert_eq!(transition.unwrap().target(&pair[0]), pair[1].as_str());
        }
    }

    #[test]
    fn history_preserves_order(states in prop::collection::vec("[a-z]{1,6}", 2..10)) {
        let mut history = StateHistory::new();
        for (i, pair) in states.windows(2).enumerate() {
            history = history.record(StateTransition {
                from: pair[0].clone(),
                to: pair[1].clone(),
                version: i as u64 + 1,
                timestamp: Utc::now(),
            });
        }

        let path = history.get_path();
        prop_assert_eq!(path.len(), states.len());
        for (step, state) in path.iter().zip(&states) {
            prop_assert_eq!(*step, state.as_str());
        }
    }

    #[test]
    fn history_record_is_pure(from in "[a-z]{1,6}", to in "[a-z]{1,6}") {
        let history = StateHistory::new();

        let new_history = history.record(StateTransition {
            from,
            to,
            version: 1,
            timestamp: Utc::now(),
        });

        // Original history unchanged
        prop_assert_eq!(history.transitions().len(), 0);
        prop_assert_eq!(new_history.transitions().len(), 1);
    }

    #[test]
    fn history_roundtrip_serialization(states in prop::collection::vec("[a-z]{1,6}", 1..5)) {
        let mut history = StateHistory::new();
        for (i, pair) in states.windows(2).enumerate() {
            history = history.record(StateTransition {
                from: pair[0].clone(),
                to: pair[1].clone(),
                version: i as u64 + 1,
                timestamp: Utc::now(),
            });
        }

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(history, deserialized);
    }
}
