//! Definition errors raised while describing states, hierarchies and transitions.

use thiserror::Error;

/// A single problem found in a state machine definition.
///
/// These are programmer errors and are reported as soon as the offending
/// definition call is made.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("State {state} cannot be its own super-state")]
    OwnSuperState { state: String },

    #[error("Initial state {initial} is not a sub-state of {super_state}")]
    InitialStateNotSubState { super_state: String, initial: String },

    #[error("State {state} cannot be added to super-state {requested} because it already has super-state {existing}")]
    AlreadyHasSuperState {
        state: String,
        existing: String,
        requested: String,
    },

    #[error("State {super_state} already has a hierarchy defined")]
    HierarchyAlreadyDefined { super_state: String },

    #[error("Adding {state} below {super_state} would create a cycle")]
    CyclicHierarchy { state: String, super_state: String },

    #[error("Transition for event {event} on state {state} is unreachable: an unguarded transition for that event already exists")]
    DuplicateTransition { state: String, event: String },
}

/// All problems found by one definition call.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid state machine definition: {}", describe(.0))]
pub struct DefinitionErrors(pub Vec<DefinitionError>);

impl DefinitionErrors {
    pub fn errors(&self) -> &[DefinitionError] {
        &self.0
    }
}

impl From<DefinitionError> for DefinitionErrors {
    fn from(error: DefinitionError) -> Self {
        Self(vec![error])
    }
}

fn describe(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
