//! Transitions and the per-state transition table.

use super::state::StateIndex;
use crate::core::{ActionHolder, GuardHolder, Identifier};
use std::collections::HashMap;

/// One edge of the state graph.
///
/// `target` is `None` for an internal transition: actions run, but no state
/// is exited or entered.
#[derive(Debug)]
pub struct Transition {
    pub(crate) source: StateIndex,
    pub(crate) target: Option<StateIndex>,
    pub(crate) guard: Option<GuardHolder>,
    pub(crate) actions: Vec<ActionHolder>,
}

impl Transition {
    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }

    pub fn guard(&self) -> Option<&GuardHolder> {
        self.guard.as_ref()
    }

    pub fn actions(&self) -> &[ActionHolder] {
        &self.actions
    }
}

/// Read-only description of a transition handed to extensions.
#[derive(Debug)]
pub struct TransitionInfo<'a, S, E> {
    pub source: &'a S,
    pub event: &'a E,
    pub target: Option<&'a S>,
}

impl<S, E> Clone for TransitionInfo<'_, S, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, E> Copy for TransitionInfo<'_, S, E> {}

/// Event id → candidate transitions, in registration order.
///
/// Several guarded transitions may share an event; the first whose guard
/// passes wins.
#[derive(Debug)]
pub struct TransitionDictionary<E: Identifier> {
    transitions: HashMap<E, Vec<Transition>>,
    order: Vec<E>,
}

impl<E: Identifier> Default for TransitionDictionary<E> {
    fn default() -> Self {
        Self {
            transitions: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<E: Identifier> TransitionDictionary<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transition for `event`. Returns `false` when an unguarded
    /// transition already exists for the event, since the new one could
    /// never fire.
    pub(crate) fn add(&mut self, event: E, transition: Transition) -> bool {
        match self.transitions.get_mut(&event) {
            Some(existing) => {
                if existing.iter().any(|t| t.guard.is_none()) {
                    return false;
                }
                existing.push(transition);
            }
            None => {
                self.order.push(event.clone());
                self.transitions.insert(event, vec![transition]);
            }
        }
        true
    }

    /// Candidates for `event`, or `None` when this state does not handle it.
    pub fn get(&self, event: &E) -> Option<&[Transition]> {
        self.transitions.get(event).map(Vec::as_slice)
    }

    pub fn contains(&self, event: &E) -> bool {
        self.transitions.contains_key(event)
    }

    /// All transitions, grouped by event in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&E, &Transition)> {
        self.order.iter().flat_map(move |event| {
            self.transitions
                .get(event)
                .into_iter()
                .flatten()
                .map(move |t| (event, t))
        })
    }

    pub fn len(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
