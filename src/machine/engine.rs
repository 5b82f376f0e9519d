//! The state machine engine: definition, initialization and event firing.
//!
//! `StateMachine` processes one event at a time on the caller's thread and
//! has no queue. The passive and active machines wrap it to add queuing and
//! a worker thread respectively.

use super::context::{RecordKind, TransitionContext};
use super::state::{StateIndex, StateTree};
use super::transition::{Transition, TransitionInfo};
use crate::builder::hierarchy::validate_hierarchy;
use crate::builder::{DefinitionError, DefinitionErrors, TransitionBuilder};
use crate::config::MachineConfig;
use crate::core::{ActionHolder, EventArgs, HistoryType, Identifier};
use crate::error::{MachineError, Result};
use crate::extension::{EventOverride, Extension, LoggingExtension, MachineInfo};
use crate::notifier::{MachineEvent, Notifier};
use crate::report::{state_views, ReportSink};
use std::sync::Arc;
use stillwater::validation::Validation;
use tracing::{debug, warn};

/// Where a caught exception came from; selects the extension hook pair.
enum Fault<'a, S, E> {
    Entry(&'a S),
    Exit(&'a S),
    Guard(TransitionInfo<'a, S, E>),
    Action(TransitionInfo<'a, S, E>),
}

/// Hierarchical state machine.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::TransitionBuilder;
/// use hsm_engine::core::{EventArgs, HistoryType};
/// use hsm_engine::StateMachine;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum States { Off, On, Dim, Bright }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Events { Toggle, Brighten }
///
/// let mut lamp = StateMachine::new("lamp");
/// lamp.define_hierarchy(States::On, States::Dim, HistoryType::Shallow, [States::Dim, States::Bright])?;
/// lamp.add_transition(States::Off, Events::Toggle, TransitionBuilder::goto(States::On))?;
/// lamp.add_transition(States::On, Events::Toggle, TransitionBuilder::goto(States::Off))?;
/// lamp.add_transition(States::Dim, Events::Brighten, TransitionBuilder::goto(States::Bright))?;
///
/// lamp.initialize(States::Off)?;
/// lamp.enter_initial_state()?;
///
/// lamp.fire(Events::Toggle, EventArgs::none())?;
/// lamp.fire(Events::Brighten, EventArgs::none())?;
/// lamp.fire(Events::Toggle, EventArgs::none())?;
/// lamp.fire(Events::Toggle, EventArgs::none())?;
///
/// // Shallow history brings the lamp back to its last brightness.
/// assert_eq!(lamp.current_state_id(), Some(&States::Bright));
/// # Ok::<(), hsm_engine::MachineError>(())
/// ```
pub struct StateMachine<S: Identifier, E: Identifier> {
    config: MachineConfig,
    tree: StateTree<S, E>,
    extensions: crate::extension::ExtensionHost<S, E>,
    notifier: Notifier<S, E>,
    initial_state: Option<StateIndex>,
    current_state: Option<StateIndex>,
}

impl<S: Identifier, E: Identifier> StateMachine<S, E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(MachineConfig::named(name))
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let mut machine = Self {
            config,
            tree: StateTree::new(),
            extensions: Default::default(),
            notifier: Notifier::default(),
            initial_state: None,
            current_state: None,
        };
        if machine.config.log_transitions {
            machine.add_extension(Arc::new(LoggingExtension::new()));
        }
        machine
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Make `sub_states` the children of `super_state`, entered through
    /// `initial` unless `history` says otherwise.
    ///
    /// All problems with the definition are reported together.
    pub fn define_hierarchy(
        &mut self,
        super_state: S,
        initial: S,
        history: HistoryType,
        sub_states: impl IntoIterator<Item = S>,
    ) -> std::result::Result<(), DefinitionErrors> {
        let sub_states: Vec<S> = sub_states.into_iter().collect();

        if let Validation::Failure(errors) =
            validate_hierarchy(&self.tree, &super_state, &initial, &sub_states)
        {
            return Err(DefinitionErrors(errors.iter().cloned().collect()));
        }

        let parent = self.tree.get_or_create(super_state);
        for sub in sub_states {
            let index = self.tree.get_or_create(sub);
            if self.tree.state(index).super_state != Some(parent) {
                self.tree.attach(parent, index);
            }
        }

        let initial = self.tree.get_or_create(initial);
        let state = self.tree.state_mut(parent);
        state.initial_state = Some(initial);
        state.history_type = history;
        Ok(())
    }

    /// Register a transition from `source` on `event`. Several guarded
    /// transitions may share an event; they are tried in registration order.
    pub fn add_transition(
        &mut self,
        source: S,
        event: E,
        transition: TransitionBuilder<S>,
    ) -> std::result::Result<(), DefinitionError> {
        let (target, guard, actions) = transition.into_parts();
        let source = self.tree.get_or_create(source);
        let target = target.map(|t| self.tree.get_or_create(t));

        let added = self.tree.state_mut(source).transitions.add(
            event.clone(),
            Transition {
                source,
                target,
                guard,
                actions,
            },
        );

        if added {
            Ok(())
        } else {
            Err(DefinitionError::DuplicateTransition {
                state: self.tree.id(source).describe(),
                event: event.describe(),
            })
        }
    }

    pub fn add_entry_action(&mut self, state: S, action: ActionHolder) {
        let index = self.tree.get_or_create(state);
        self.tree.state_mut(index).entry_actions.push(action);
    }

    pub fn add_exit_action(&mut self, state: S, action: ActionHolder) {
        let index = self.tree.get_or_create(state);
        self.tree.state_mut(index).exit_actions.push(action);
    }

    pub fn add_extension(&mut self, extension: Arc<dyn Extension<S, E>>) {
        self.extensions.add(extension);
    }

    /// Remove a previously added extension (compared by pointer).
    pub fn remove_extension(&mut self, extension: &Arc<dyn Extension<S, E>>) -> bool {
        self.extensions.remove(extension)
    }

    pub fn clear_extensions(&mut self) {
        self.extensions.clear();
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    pub fn subscribe(&mut self, handler: impl Fn(&MachineEvent<S, E>) + Send + 'static) {
        self.notifier.subscribe(Box::new(handler));
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifier.len()
    }

    /// Run `hook` for every extension with the current machine info.
    pub(crate) fn notify_extensions(&self, mut hook: impl FnMut(&dyn Extension<S, E>, &MachineInfo<'_, S>)) {
        let info = self.info();
        self.extensions.for_each(|extension| hook(extension, &info));
    }

    pub fn is_initialized(&self) -> bool {
        self.initial_state.is_some()
    }

    pub fn has_entered_initial_state(&self) -> bool {
        self.current_state.is_some()
    }

    pub fn initial_state_id(&self) -> Option<&S> {
        self.initial_state.map(|i| self.tree.id(i))
    }

    /// Current leaf state; `None` until the initial state was entered.
    pub fn current_state_id(&self) -> Option<&S> {
        self.current_state.map(|i| self.tree.id(i))
    }

    pub fn states(&self) -> &StateTree<S, E> {
        &self.tree
    }

    /// Set the initial state. Extensions may substitute a different one.
    pub fn initialize(&mut self, initial_state: S) -> Result<()> {
        if self.is_initialized() {
            return Err(MachineError::AlreadyInitialized);
        }

        let info = self.info();
        let initial_state = self
            .extensions
            .thread(initial_state, |e, s| e.initializing_state_machine(&info, s));

        let index = self.tree.get_or_create(initial_state);
        self.initial_state = Some(index);

        debug!(machine = %self.config.name, initial_state = ?self.tree.id(index), "Initialized state machine");
        self.notify_extensions(|e, info| e.initialized_state_machine(info, self.tree.id(index)));
        Ok(())
    }

    /// Enter the initial state, its ancestors outermost first, and then its
    /// sub-states down to a leaf.
    pub fn enter_initial_state(&mut self) -> Result<()> {
        let initial = self.initial_state.ok_or(MachineError::NotInitialized)?;
        if self.has_entered_initial_state() {
            return Err(MachineError::InitialStateAlreadyEntered);
        }

        self.notify_extensions(|e, info| e.entering_initial_state(info, self.tree.id(initial)));

        let mut context = TransitionContext::for_initial_state();
        let ancestors: Vec<StateIndex> = self.tree.ancestors(initial).collect();
        for ancestor in ancestors.into_iter().rev() {
            self.enter(ancestor, &mut context);
        }
        self.enter(initial, &mut context);
        let leaf = self.enter_by_history(initial, &mut context);

        self.set_current_state(leaf);

        debug!(
            machine = %self.config.name,
            state = ?self.tree.id(leaf),
            records = %context.records_description(),
            "Entered initial state"
        );
        self.notify_extensions(|e, info| e.entered_initial_state(info, self.tree.id(leaf), &context));
        Ok(())
    }

    /// Fire `event` immediately.
    ///
    /// Declined events and exceptions in user code are reported to
    /// subscribers and extensions; only misuse of the machine is returned as
    /// an error.
    pub fn fire(&mut self, event: E, event_args: EventArgs) -> Result<()> {
        if !self.is_initialized() {
            return Err(MachineError::NotInitialized);
        }
        let current = self.current_state.ok_or(MachineError::InitialStateNotEntered)?;

        let info = self.info();
        let EventOverride { event, event_args } = self.extensions.thread(
            EventOverride { event, event_args },
            |e, o| e.firing_event(&info, &o.event, &o.event_args),
        );

        let mut context =
            TransitionContext::for_event(self.tree.id(current).clone(), event.clone(), event_args);

        match self.dispatch(current, &event, &mut context) {
            Some(new_state) => {
                self.set_current_state(new_state);
                debug!(
                    machine = %self.config.name,
                    ?event,
                    state = ?self.tree.id(new_state),
                    records = %context.records_description(),
                    "Fired event"
                );
                self.notify_extensions(|e, info| e.fired_event(info, &context));
                self.notifier.transition_completed(&context, self.tree.id(new_state));
            }
            None => {
                debug!(machine = %self.config.name, ?event, state = ?self.tree.id(current), "Transition declined");
                self.notifier.transition_declined(&context);
            }
        }
        Ok(())
    }

    /// Report the state graph to `sink`.
    pub fn report(&self, sink: &mut dyn ReportSink<S, E>) {
        sink.report(
            self.name(),
            self.initial_state_id(),
            &state_views(&self.tree),
        );
    }

    pub(crate) fn info(&self) -> MachineInfo<'_, S> {
        MachineInfo {
            name: &self.config.name,
            current_state: self.current_state_id(),
        }
    }

    /// Restore position without running any entry action.
    pub(crate) fn restore(&mut self, initial_state: StateIndex, current_state: Option<StateIndex>) {
        self.initial_state = Some(initial_state);
        self.current_state = current_state;
    }

    fn set_current_state(&mut self, new_state: StateIndex) {
        let old_state = self.current_state.replace(new_state);
        if old_state == Some(new_state) {
            return;
        }
        let old_state = old_state.map(|i| self.tree.id(i));
        self.notify_extensions(|e, info| e.switched_state(info, old_state, self.tree.id(new_state)));
    }

    /// Find and execute the transition for `event`. Returns the new state,
    /// or `None` when the event was declined.
    ///
    /// Only the innermost level that has any transition for the event is
    /// searched; if none of its guards pass, outer levels are not consulted.
    fn dispatch(
        &self,
        current: StateIndex,
        event: &E,
        context: &mut TransitionContext<S, E>,
    ) -> Option<StateIndex> {
        let candidates = std::iter::once(current)
            .chain(self.tree.ancestors(current))
            .find_map(|i| self.tree.state(i).transitions.get(event))?;

        for transition in candidates {
            let edge = TransitionInfo {
                source: self.tree.id(transition.source),
                event,
                target: transition.target.map(|t| self.tree.id(t)),
            };
            if self.guard_passes(transition, edge, context) {
                return Some(self.execute(current, transition, edge, context));
            }
        }
        None
    }

    fn guard_passes(
        &self,
        transition: &Transition,
        edge: TransitionInfo<'_, S, E>,
        context: &mut TransitionContext<S, E>,
    ) -> bool {
        let Some(guard) = &transition.guard else {
            return true;
        };
        match guard.check(context.event_args()) {
            Ok(passes) => passes,
            Err(error) => {
                self.handle_exception(Fault::Guard(edge), context, error);
                false
            }
        }
    }

    fn execute(
        &self,
        current: StateIndex,
        transition: &Transition,
        edge: TransitionInfo<'_, S, E>,
        context: &mut TransitionContext<S, E>,
    ) -> StateIndex {
        self.notifier.transition_begin(context);

        let Some(target) = transition.target else {
            self.perform_actions(transition, edge, context);
            return current;
        };

        self.unwind(current, transition.source, context);
        self.traverse(transition.source, target, target, transition, edge, context);
        self.enter_by_history(target, context)
    }

    /// Exit from the current leaf up to, but excluding, the state that owns
    /// the transition.
    fn unwind(&self, current: StateIndex, source: StateIndex, context: &mut TransitionContext<S, E>) {
        let mut state = current;
        while state != source {
            self.exit(state, context);
            match self.tree.state(state).super_state {
                Some(parent) => state = parent,
                None => break,
            }
        }
    }

    /// Exit up to the common ancestor of `source` and `target`, run the
    /// transition actions, then enter down to `target`.
    fn traverse(
        &self,
        source: StateIndex,
        target: StateIndex,
        final_target: StateIndex,
        transition: &Transition,
        edge: TransitionInfo<'_, S, E>,
        context: &mut TransitionContext<S, E>,
    ) {
        let from = self.tree.state(source);
        let to = self.tree.state(target);

        if source == final_target {
            // Self transition, or the final target is an ancestor of the source.
            self.exit(source, context);
            self.perform_actions(transition, edge, context);
            self.enter(final_target, context);
        } else if source == target {
            self.perform_actions(transition, edge, context);
        } else if from.super_state == to.super_state {
            self.exit(source, context);
            self.perform_actions(transition, edge, context);
            self.enter(target, context);
        } else if from.level > to.level {
            self.exit(source, context);
            if let Some(parent) = from.super_state {
                self.traverse(parent, target, final_target, transition, edge, context);
            }
        } else if from.level < to.level {
            if let Some(parent) = to.super_state {
                self.traverse(source, parent, final_target, transition, edge, context);
            }
            self.enter(target, context);
        } else {
            self.exit(source, context);
            if let (Some(source_parent), Some(target_parent)) = (from.super_state, to.super_state) {
                self.traverse(source_parent, target_parent, final_target, transition, edge, context);
            }
            self.enter(target, context);
        }
    }

    fn perform_actions(
        &self,
        transition: &Transition,
        edge: TransitionInfo<'_, S, E>,
        context: &mut TransitionContext<S, E>,
    ) {
        let event_args = context.event_args().clone();
        for action in &transition.actions {
            if let Err(error) = action.execute(&event_args) {
                self.handle_exception(Fault::Action(edge), context, error);
            }
        }
    }

    /// Enter the sub-states of an already entered `state` according to its
    /// history type and return the resulting leaf.
    fn enter_by_history(&self, state: StateIndex, context: &mut TransitionContext<S, E>) -> StateIndex {
        let node = self.tree.state(state);
        let Some(initial) = node.initial_state else {
            return state;
        };
        let remembered = self.tree.last_active(state).unwrap_or(initial);

        match node.history_type {
            HistoryType::None => self.enter_shallow(initial, context),
            HistoryType::Shallow => self.enter_shallow(remembered, context),
            HistoryType::Deep => self.enter_deep(remembered, context),
        }
    }

    /// Enter `state`, then cascade through initial sub-states to a leaf.
    fn enter_shallow(&self, state: StateIndex, context: &mut TransitionContext<S, E>) -> StateIndex {
        let mut state = state;
        loop {
            self.enter(state, context);
            match self.tree.state(state).initial_state {
                Some(initial) => state = initial,
                None => return state,
            }
        }
    }

    /// Enter `state`, then cascade through last active sub-states (initial
    /// ones where nothing was active yet) to a leaf.
    fn enter_deep(&self, state: StateIndex, context: &mut TransitionContext<S, E>) -> StateIndex {
        let mut state = state;
        loop {
            self.enter(state, context);
            let node = self.tree.state(state);
            match self.tree.last_active(state).or(node.initial_state) {
                Some(next) => state = next,
                None => return state,
            }
        }
    }

    fn enter(&self, state: StateIndex, context: &mut TransitionContext<S, E>) {
        let node = self.tree.state(state);
        context.add_record(node.id.clone(), RecordKind::Enter);

        let no_args = EventArgs::none();
        for action in &node.entry_actions {
            if let Err(error) = action.execute(&no_args) {
                self.handle_exception(Fault::Entry(&node.id), context, error);
            }
        }
    }

    fn exit(&self, state: StateIndex, context: &mut TransitionContext<S, E>) {
        let node = self.tree.state(state);
        context.add_record(node.id.clone(), RecordKind::Exit);

        let no_args = EventArgs::none();
        for action in &node.exit_actions {
            if let Err(error) = action.execute(&no_args) {
                self.handle_exception(Fault::Exit(&node.id), context, error);
            }
        }
        self.tree.record_last_active(state);
    }

    /// Let extensions replace the exception, record it, notify subscribers,
    /// then report the final exception back to extensions.
    fn handle_exception(
        &self,
        fault: Fault<'_, S, E>,
        context: &mut TransitionContext<S, E>,
        error: anyhow::Error,
    ) {
        let info = self.info();
        let exception = {
            let context: &TransitionContext<S, E> = context;
            self.extensions.thread(Arc::new(error), |e, exception| match &fault {
                Fault::Entry(state) => e.handling_entry_action_exception(&info, state, context, exception),
                Fault::Exit(state) => e.handling_exit_action_exception(&info, state, context, exception),
                Fault::Guard(edge) => e.handling_guard_exception(&info, edge, context, exception),
                Fault::Action(edge) => e.handling_transition_exception(&info, edge, context, exception),
            })
        };

        warn!(machine = %self.config.name, error = %exception, "{}", fault.describe());

        context.add_exception(Arc::clone(&exception));
        self.notifier.exception(context, Arc::clone(&exception));

        let context: &TransitionContext<S, E> = context;
        self.extensions.for_each(|e| match &fault {
            Fault::Entry(state) => e.handled_entry_action_exception(&info, state, context, &exception),
            Fault::Exit(state) => e.handled_exit_action_exception(&info, state, context, &exception),
            Fault::Guard(edge) => e.handled_guard_exception(&info, edge, context, &exception),
            Fault::Action(edge) => e.handled_transition_exception(&info, edge, context, &exception),
        });
    }
}

impl<S: Identifier, E: Identifier> Fault<'_, S, E> {
    fn describe(&self) -> String {
        match self {
            Self::Entry(state) => format!("Entry action of {} failed", S::describe(state)),
            Self::Exit(state) => format!("Exit action of {} failed", S::describe(state)),
            Self::Guard(edge) => format!(
                "Guard of transition {} on {} failed",
                edge.source.describe(),
                edge.event.describe()
            ),
            Self::Action(edge) => format!(
                "Action of transition {} on {} failed",
                edge.source.describe(),
                edge.event.describe()
            ),
        }
    }
}

impl<S: Identifier, E: Identifier> std::fmt::Debug for StateMachine<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.config.name)
            .field("states", &self.tree.len())
            .field("initial_state", &self.initial_state_id())
            .field("current_state", &self.current_state_id())
            .finish()
    }
}
