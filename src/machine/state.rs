//! States and the hierarchy that owns them.
//!
//! All states of a machine live in one arena (`StateTree`). Parent and child
//! links are indices into that arena, so the bidirectional hierarchy needs no
//! shared ownership.

use super::transition::TransitionDictionary;
use crate::core::{ActionHolder, HistoryType, Identifier};
use std::cell::Cell;
use std::collections::HashMap;

/// Position of a state in its `StateTree`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateIndex(pub(crate) usize);

/// A node of the state hierarchy.
#[derive(Debug)]
pub struct State<S, E: Identifier> {
    pub(crate) id: S,
    pub(crate) super_state: Option<StateIndex>,
    pub(crate) sub_states: Vec<StateIndex>,
    pub(crate) initial_state: Option<StateIndex>,
    pub(crate) history_type: HistoryType,
    // Written while states are exited during a transition that only holds a
    // shared borrow of the tree.
    pub(crate) last_active_state: Cell<Option<StateIndex>>,
    pub(crate) level: usize,
    pub(crate) entry_actions: Vec<ActionHolder>,
    pub(crate) exit_actions: Vec<ActionHolder>,
    pub(crate) transitions: TransitionDictionary<E>,
}

impl<S, E: Identifier> State<S, E> {
    fn new(id: S) -> Self {
        Self {
            id,
            super_state: None,
            sub_states: Vec::new(),
            initial_state: None,
            history_type: HistoryType::None,
            last_active_state: Cell::new(None),
            level: 0,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            transitions: TransitionDictionary::new(),
        }
    }

    pub fn id(&self) -> &S {
        &self.id
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn history_type(&self) -> HistoryType {
        self.history_type
    }

    pub fn is_composite(&self) -> bool {
        !self.sub_states.is_empty()
    }

    pub fn entry_actions(&self) -> &[ActionHolder] {
        &self.entry_actions
    }

    pub fn exit_actions(&self) -> &[ActionHolder] {
        &self.exit_actions
    }

    pub fn transitions(&self) -> &TransitionDictionary<E> {
        &self.transitions
    }
}

/// Arena of all states of one machine, in creation order.
#[derive(Debug)]
pub struct StateTree<S: Identifier, E: Identifier> {
    states: Vec<State<S, E>>,
    index: HashMap<S, StateIndex>,
}

impl<S: Identifier, E: Identifier> Default for StateTree<S, E> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: Identifier, E: Identifier> StateTree<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a state, creating it on first mention.
    pub(crate) fn get_or_create(&mut self, id: S) -> StateIndex {
        if let Some(index) = self.index.get(&id) {
            return *index;
        }
        let index = StateIndex(self.states.len());
        self.states.push(State::new(id.clone()));
        self.index.insert(id, index);
        index
    }

    pub fn find(&self, id: &S) -> Option<StateIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn state(&self, index: StateIndex) -> &State<S, E> {
        &self.states[index.0]
    }

    pub(crate) fn state_mut(&mut self, index: StateIndex) -> &mut State<S, E> {
        &mut self.states[index.0]
    }

    pub(crate) fn id(&self, index: StateIndex) -> &S {
        &self.states[index.0].id
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States without a super-state, in creation order.
    pub(crate) fn roots(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.super_state.is_none())
            .map(|(i, _)| StateIndex(i))
    }

    /// Composite states, in creation order.
    pub(crate) fn composites(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_composite())
            .map(|(i, _)| StateIndex(i))
    }

    /// Ancestors of `index`, innermost first, excluding `index` itself.
    pub(crate) fn ancestors(&self, index: StateIndex) -> impl Iterator<Item = StateIndex> + '_ {
        std::iter::successors(self.state(index).super_state, move |i| {
            self.state(*i).super_state
        })
    }

    /// Whether `candidate` is `index` or one of its ancestors.
    pub(crate) fn is_self_or_ancestor(&self, candidate: StateIndex, index: StateIndex) -> bool {
        candidate == index || self.ancestors(index).any(|a| a == candidate)
    }

    /// Attach `sub` below `parent` and recompute the levels of `sub`'s subtree.
    pub(crate) fn attach(&mut self, parent: StateIndex, sub: StateIndex) {
        self.state_mut(sub).super_state = Some(parent);
        self.state_mut(parent).sub_states.push(sub);
        let level = self.state(parent).level + 1;
        self.set_level(sub, level);
    }

    fn set_level(&mut self, index: StateIndex, level: usize) {
        let mut pending = vec![(index, level)];
        while let Some((current, level)) = pending.pop() {
            let state = self.state_mut(current);
            state.level = level;
            pending.extend(state.sub_states.iter().map(|s| (*s, level + 1)));
        }
    }

    /// Remember `index` as the last active sub-state of its super-state.
    pub(crate) fn record_last_active(&self, index: StateIndex) {
        if let Some(parent) = self.state(index).super_state {
            self.state(parent).last_active_state.set(Some(index));
        }
    }

    pub(crate) fn last_active(&self, index: StateIndex) -> Option<StateIndex> {
        self.state(index).last_active_state.get()
    }
}
