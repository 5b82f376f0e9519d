//! Validation of hierarchy definitions.
//!
//! Uses Stillwater's `Validation` so that a single `define_hierarchy` call
//! reports every problem instead of only the first one.

use crate::builder::error::DefinitionError;
use crate::core::Identifier;
use crate::machine::StateTree;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type HierarchyValidation = Validation<(), NonEmptyVec<DefinitionError>>;

fn check(valid: bool, error: impl FnOnce() -> DefinitionError) -> HierarchyValidation {
    if valid {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Check that `sub_states` may be placed below `super_state` with `initial`
/// as initial sub-state, accumulating ALL violations.
pub(crate) fn validate_hierarchy<S: Identifier, E: Identifier>(
    tree: &StateTree<S, E>,
    super_state: &S,
    initial: &S,
    sub_states: &[S],
) -> HierarchyValidation {
    let mut checks: Vec<HierarchyValidation> = Vec::new();
    let super_index = tree.find(super_state);

    checks.push(check(!sub_states.contains(super_state), || {
        DefinitionError::OwnSuperState {
            state: super_state.describe(),
        }
    }));

    checks.push(check(sub_states.contains(initial), || {
        DefinitionError::InitialStateNotSubState {
            super_state: super_state.describe(),
            initial: initial.describe(),
        }
    }));

    let already_defined = super_index.is_some_and(|i| tree.state(i).is_composite());
    checks.push(check(!already_defined, || DefinitionError::HierarchyAlreadyDefined {
        super_state: super_state.describe(),
    }));

    for sub in sub_states.iter().filter(|s| *s != super_state) {
        let Some(sub_index) = tree.find(sub) else {
            continue;
        };

        if let Some(existing) = tree.state(sub_index).super_state {
            checks.push(check(false, || DefinitionError::AlreadyHasSuperState {
                state: sub.describe(),
                existing: tree.id(existing).describe(),
                requested: super_state.describe(),
            }));
        }

        let cyclic = super_index.is_some_and(|i| tree.is_self_or_ancestor(sub_index, i));
        checks.push(check(!cyclic, || DefinitionError::CyclicHierarchy {
            state: sub.describe(),
            super_state: super_state.describe(),
        }));
    }

    Validation::all_vec(checks).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        A,
        B,
        B1,
        B2,
        C,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {}

    fn errors(result: HierarchyValidation) -> Vec<DefinitionError> {
        match result {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    #[test]
    fn valid_hierarchy_passes() {
        let tree: StateTree<TestState, TestEvent> = StateTree::new();
        let result = validate_hierarchy(
            &tree,
            &TestState::B,
            &TestState::B1,
            &[TestState::B1, TestState::B2],
        );
        assert!(result.is_success());
    }

    #[test]
    fn accumulates_all_violations() {
        let tree: StateTree<TestState, TestEvent> = StateTree::new();
        let result = validate_hierarchy(&tree, &TestState::B, &TestState::C, &[TestState::B, TestState::B1]);

        let errors = errors(result);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&DefinitionError::OwnSuperState {
            state: "B".to_string()
        }));
        assert!(errors.contains(&DefinitionError::InitialStateNotSubState {
            super_state: "B".to_string(),
            initial: "C".to_string(),
        }));
    }

    #[test]
    fn rejects_sub_state_with_other_super_state() {
        let mut tree: StateTree<TestState, TestEvent> = StateTree::new();
        let a = tree.get_or_create(TestState::A);
        let b1 = tree.get_or_create(TestState::B1);
        tree.attach(a, b1);

        let errors = errors(validate_hierarchy(&tree, &TestState::B, &TestState::B1, &[TestState::B1]));
        assert_eq!(
            errors,
            vec![DefinitionError::AlreadyHasSuperState {
                state: "B1".to_string(),
                existing: "A".to_string(),
                requested: "B".to_string(),
            }]
        );
    }

    #[test]
    fn rejects_cycles() {
        let mut tree: StateTree<TestState, TestEvent> = StateTree::new();
        let a = tree.get_or_create(TestState::A);
        let b = tree.get_or_create(TestState::B);
        tree.attach(a, b);

        let errors = errors(validate_hierarchy(&tree, &TestState::B, &TestState::A, &[TestState::A]));
        assert_eq!(
            errors,
            vec![DefinitionError::CyclicHierarchy {
                state: "A".to_string(),
                super_state: "B".to_string(),
            }]
        );
    }

    #[test]
    fn rejects_second_definition_for_same_super_state() {
        let mut tree: StateTree<TestState, TestEvent> = StateTree::new();
        let b = tree.get_or_create(TestState::B);
        let b1 = tree.get_or_create(TestState::B1);
        tree.attach(b, b1);

        let errors = errors(validate_hierarchy(&tree, &TestState::B, &TestState::B2, &[TestState::B2]));
        assert_eq!(
            errors,
            vec![DefinitionError::HierarchyAlreadyDefined {
                super_state: "B".to_string()
            }]
        );
    }
}
