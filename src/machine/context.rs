//! Per-operation record of what happened while firing an event or entering
//! the initial state.

use crate::core::{EventArgs, Identifier};
use crate::error::Exception;
use std::fmt;

/// Whether a state was entered or exited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Enter,
    Exit,
}

/// One entry or exit performed during an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<S> {
    pub state: S,
    pub kind: RecordKind,
}

impl<S: Identifier> fmt::Display for Record<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            RecordKind::Enter => "Enter",
            RecordKind::Exit => "Exit",
        };
        write!(f, "{verb} {}", self.state.describe())
    }
}

/// Context of one `fire` (event present) or of the initial-state entry
/// (no event, no current state).
///
/// Created for the operation and discarded once it completes.
#[derive(Clone, Debug)]
pub struct TransitionContext<S, E> {
    state: Option<S>,
    event: Option<E>,
    event_args: EventArgs,
    records: Vec<Record<S>>,
    exceptions: Vec<Exception>,
}

impl<S: Identifier, E: Identifier> TransitionContext<S, E> {
    pub(crate) fn for_event(state: S, event: E, event_args: EventArgs) -> Self {
        Self {
            state: Some(state),
            event: Some(event),
            event_args,
            records: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    pub(crate) fn for_initial_state() -> Self {
        Self {
            state: None,
            event: None,
            event_args: EventArgs::none(),
            records: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    /// State the machine was in when the operation started.
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn event(&self) -> Option<&E> {
        self.event.as_ref()
    }

    pub fn event_args(&self) -> &EventArgs {
        &self.event_args
    }

    /// Whether this context belongs to a fired event rather than to the
    /// initial-state entry.
    pub fn is_transition(&self) -> bool {
        self.event.is_some()
    }

    pub fn records(&self) -> &[Record<S>] {
        &self.records
    }

    /// Exceptions caught during the operation, after extension overrides.
    pub fn exceptions(&self) -> &[Exception] {
        &self.exceptions
    }

    /// Entries and exits in execution order, e.g. `Exit A -> Enter B`.
    pub fn records_description(&self) -> String {
        self.records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub(crate) fn add_record(&mut self, state: S, kind: RecordKind) {
        self.records.push(Record { state, kind });
    }

    pub(crate) fn add_exception(&mut self, exception: Exception) {
        self.exceptions.push(exception);
    }
}
