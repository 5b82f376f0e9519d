//! Builder for the transitions added to a state.

use crate::core::{ActionHolder, ActionOutcome, GuardHolder, GuardOutcome};

/// Describes one transition before it is added to the machine with
/// `StateMachine::add_transition`.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::TransitionBuilder;
/// use hsm_engine::core::GuardHolder;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum States { Open, Closed }
///
/// let close = TransitionBuilder::goto(States::Closed)
///     .guard(GuardHolder::with_argument(|force: &bool| *force).named("forced"))
///     .execute(|| println!("closing"));
///
/// assert_eq!(close.target(), Some(&States::Closed));
/// assert_eq!(close.guard_name(), Some("forced"));
///
/// let ping = TransitionBuilder::<States>::internal().execute(|| ());
/// assert!(ping.target().is_none());
/// ```
#[derive(Debug)]
pub struct TransitionBuilder<S> {
    target: Option<S>,
    guard: Option<GuardHolder>,
    actions: Vec<ActionHolder>,
}

impl<S> TransitionBuilder<S> {
    /// Transition that switches to `target`.
    pub fn goto(target: S) -> Self {
        Self {
            target: Some(target),
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Transition that runs its actions without leaving the current state.
    pub fn internal() -> Self {
        Self {
            target: None,
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Set the guard (optional).
    pub fn guard(mut self, guard: GuardHolder) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Set an argument-less guard from a closure (optional).
    pub fn when<F, R>(self, predicate: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: GuardOutcome,
    {
        self.guard(GuardHolder::new(predicate))
    }

    /// Append an action; actions run in the order they were added.
    pub fn action(mut self, action: ActionHolder) -> Self {
        self.actions.push(action);
        self
    }

    /// Append an argument-less action from a closure.
    pub fn execute<F, R>(self, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: ActionOutcome,
    {
        self.action(ActionHolder::new(action))
    }

    pub fn target(&self) -> Option<&S> {
        self.target.as_ref()
    }

    pub fn guard_name(&self) -> Option<&str> {
        self.guard.as_ref().map(GuardHolder::name)
    }

    pub(crate) fn into_parts(self) -> (Option<S>, Option<GuardHolder>, Vec<ActionHolder>) {
        (self.target, self.guard, self.actions)
    }
}
