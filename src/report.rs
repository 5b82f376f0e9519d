//! Read-only rendering of a machine's state graph.
//!
//! The engine hands a `ReportSink` the machine name, the initial state and a
//! tree of `StateView`s; `TextReport` renders them as indented text.

use crate::core::{ActionHolder, HistoryType, Identifier};
use crate::machine::{StateIndex, StateTree};
use std::fmt::Write;

/// A transition as seen by a report.
#[derive(Clone, Debug)]
pub struct TransitionView<'a, S, E> {
    pub event: &'a E,
    /// `None` for internal transitions.
    pub target: Option<&'a S>,
    pub actions: Vec<&'a str>,
    pub guard: Option<&'a str>,
}

/// A state and its subtree as seen by a report.
#[derive(Clone, Debug)]
pub struct StateView<'a, S, E> {
    pub id: &'a S,
    pub initial_state: Option<&'a S>,
    pub history_type: HistoryType,
    pub entry_actions: Vec<&'a str>,
    pub exit_actions: Vec<&'a str>,
    pub transitions: Vec<TransitionView<'a, S, E>>,
    pub sub_states: Vec<StateView<'a, S, E>>,
}

/// Receives the description of a state machine.
pub trait ReportSink<S, E> {
    fn report(&mut self, name: &str, initial_state: Option<&S>, states: &[StateView<'_, S, E>]);
}

/// Views of the root states, each with its full subtree.
pub(crate) fn state_views<S: Identifier, E: Identifier>(tree: &StateTree<S, E>) -> Vec<StateView<'_, S, E>> {
    tree.roots().map(|root| view(tree, root)).collect()
}

fn view<S: Identifier, E: Identifier>(tree: &StateTree<S, E>, index: StateIndex) -> StateView<'_, S, E> {
    let state = tree.state(index);
    StateView {
        id: state.id(),
        initial_state: state.initial_state.map(|i| tree.id(i)),
        history_type: state.history_type(),
        entry_actions: state.entry_actions().iter().map(ActionHolder::name).collect(),
        exit_actions: state.exit_actions().iter().map(ActionHolder::name).collect(),
        transitions: state
            .transitions()
            .iter()
            .map(|(event, transition)| TransitionView {
                event,
                target: transition.target.map(|t| tree.id(t)),
                actions: transition.actions().iter().map(ActionHolder::name).collect(),
                guard: transition.guard().map(|g| g.name()),
            })
            .collect(),
        sub_states: state.sub_states.iter().map(|s| view(tree, *s)).collect(),
    }
}

const INDENT: &str = "    ";

/// Renders a report as indented text:
///
/// ```text
/// elevator: initial state = OnFloor
///     Healthy: initial state = OnFloor history type = Deep
///         entry action:
///         exit action:
///         ErrorOccured -> Error actions: guard:
///         OnFloor: initial state = DoorClosed history type = None
///             entry action: AnnounceFloor
/// ```
///
/// Every level is indented by four spaces and transitions are listed before
/// sub-states.
#[derive(Clone, Debug, Default)]
pub struct TextReport {
    output: String,
}

impl TextReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> &str {
        &self.output
    }

    pub fn into_string(self) -> String {
        self.output
    }

    fn line(&mut self, depth: usize, text: std::fmt::Arguments<'_>) {
        writeln!(self.output, "{}{}", INDENT.repeat(depth), text).ok();
    }

    fn state<S: Identifier, E: Identifier>(&mut self, view: &StateView<'_, S, E>, depth: usize) {
        self.line(
            depth,
            format_args!(
                "{}: initial state = {} history type = {}",
                view.id.describe(),
                describe_optional(view.initial_state),
                view.history_type
            ),
        );

        let depth = depth + 1;
        self.line(depth, format_args!("entry action:{}", list(&view.entry_actions)));
        self.line(depth, format_args!("exit action:{}", list(&view.exit_actions)));

        for transition in &view.transitions {
            let target = transition
                .target
                .map(Identifier::describe)
                .unwrap_or_else(|| "internal".to_string());
            let guard = transition.guard.map(|g| format!(" {g}")).unwrap_or_default();
            self.line(
                depth,
                format_args!(
                    "{} -> {} actions:{} guard:{}",
                    transition.event.describe(),
                    target,
                    list(&transition.actions),
                    guard
                ),
            );
        }

        for sub_state in &view.sub_states {
            self.state(sub_state, depth);
        }
    }
}

impl<S: Identifier, E: Identifier> ReportSink<S, E> for TextReport {
    fn report(&mut self, name: &str, initial_state: Option<&S>, states: &[StateView<'_, S, E>]) {
        self.output.clear();
        self.line(
            0,
            format_args!("{name}: initial state = {}", describe_optional(initial_state)),
        );
        for state in states {
            self.state(state, 1);
        }
    }
}

fn describe_optional<S: Identifier>(state: Option<&S>) -> String {
    state.map(Identifier::describe).unwrap_or_else(|| "None".to_string())
}

/// Names separated by ", " with a leading space, or nothing when empty.
fn list(names: &[&str]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(" {}", names.join(", "))
    }
}
