//! Extensions: observers that can also override in-flight values.
//!
//! Every hook has a no-op default, so an extension implements only what it
//! needs. Hooks come in pairs: the "-ing" hook runs before the effect and may
//! return `Some(value)` to replace the value, the "-ed" hook runs afterwards
//! with the final value. Extensions run in registration order and each sees
//! the override of its predecessor.
//!
//! # Example
//!
//! ```rust
//! use hsm_engine::extension::{Extension, MachineInfo};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum States { Off, Safe }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Events { Toggle }
//!
//! /// Always boots into the safe state.
//! struct SafeBoot;
//!
//! impl Extension<States, Events> for SafeBoot {
//!     fn initializing_state_machine(
//!         &self,
//!         _machine: &MachineInfo<'_, States>,
//!         _initial_state: &States,
//!     ) -> Option<States> {
//!         Some(States::Safe)
//!     }
//! }
//! ```

pub mod logging;

pub use logging::LoggingExtension;

use crate::core::{EventArgs, Identifier};
use crate::error::Exception;
use crate::machine::{TransitionContext, TransitionInfo};
use std::sync::Arc;

/// Snapshot of the machine handed to every hook.
#[derive(Debug)]
pub struct MachineInfo<'a, S> {
    pub name: &'a str,
    pub current_state: Option<&'a S>,
}

impl<S> Clone for MachineInfo<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for MachineInfo<'_, S> {}

/// Replacement for an event about to be fired.
#[derive(Clone, Debug)]
pub struct EventOverride<E> {
    pub event: E,
    pub event_args: EventArgs,
}

#[allow(unused_variables)]
pub trait Extension<S: Identifier, E: Identifier>: Send + Sync {
    fn started_state_machine(&self, machine: &MachineInfo<'_, S>) {}

    fn stopped_state_machine(&self, machine: &MachineInfo<'_, S>) {}

    fn event_queued(&self, machine: &MachineInfo<'_, S>, event: &E, event_args: &EventArgs) {}

    fn event_queued_with_priority(
        &self,
        machine: &MachineInfo<'_, S>,
        event: &E,
        event_args: &EventArgs,
    ) {
    }

    /// Called whenever the current state is set, with the previous state
    /// (`None` on initial entry).
    fn switched_state(&self, machine: &MachineInfo<'_, S>, old_state: Option<&S>, new_state: &S) {}

    /// Return `Some` to initialize with a different state.
    fn initializing_state_machine(&self, machine: &MachineInfo<'_, S>, initial_state: &S) -> Option<S> {
        None
    }

    fn initialized_state_machine(&self, machine: &MachineInfo<'_, S>, initial_state: &S) {}

    fn entering_initial_state(&self, machine: &MachineInfo<'_, S>, state: &S) {}

    fn entered_initial_state(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<S, E>,
    ) {
    }

    /// Return `Some` to fire a different event and/or arguments.
    fn firing_event(
        &self,
        machine: &MachineInfo<'_, S>,
        event: &E,
        event_args: &EventArgs,
    ) -> Option<EventOverride<E>> {
        None
    }

    fn fired_event(&self, machine: &MachineInfo<'_, S>, context: &TransitionContext<S, E>) {}

    fn handling_entry_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) -> Option<Exception> {
        None
    }

    fn handled_entry_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
    }

    fn handling_exit_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) -> Option<Exception> {
        None
    }

    fn handled_exit_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
    }

    fn handling_guard_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S, E>,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) -> Option<Exception> {
        None
    }

    fn handled_guard_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S, E>,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
    }

    fn handling_transition_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S, E>,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) -> Option<Exception> {
        None
    }

    fn handled_transition_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S, E>,
        context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
    }
}

/// Registered extensions, in registration order.
pub(crate) struct ExtensionHost<S: Identifier, E: Identifier> {
    extensions: Vec<Arc<dyn Extension<S, E>>>,
}

impl<S: Identifier, E: Identifier> Default for ExtensionHost<S, E> {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }
}

impl<S: Identifier, E: Identifier> ExtensionHost<S, E> {
    pub fn add(&mut self, extension: Arc<dyn Extension<S, E>>) {
        self.extensions.push(extension);
    }

    /// Remove by identity. Returns whether the extension was registered.
    pub fn remove(&mut self, extension: &Arc<dyn Extension<S, E>>) -> bool {
        let before = self.extensions.len();
        self.extensions.retain(|e| !Arc::ptr_eq(e, extension));
        self.extensions.len() != before
    }

    pub fn clear(&mut self) {
        self.extensions.clear();
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn for_each(&self, mut hook: impl FnMut(&dyn Extension<S, E>)) {
        for extension in &self.extensions {
            hook(extension.as_ref());
        }
    }

    /// Thread `value` through every extension; each may replace it.
    pub fn thread<T>(&self, value: T, mut hook: impl FnMut(&dyn Extension<S, E>, &T) -> Option<T>) -> T {
        self.extensions.iter().fold(value, |current, extension| {
            hook(extension.as_ref(), &current).unwrap_or(current)
        })
    }
}
