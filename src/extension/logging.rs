//! Extension that reports machine activity through `tracing`.

use super::{Extension, MachineInfo};
use crate::core::{EventArgs, Identifier};
use crate::error::Exception;
use crate::machine::{TransitionContext, TransitionInfo};
use tracing::{debug, info, warn};

/// Logs every lifecycle step, fired event and caught exception.
///
/// Lifecycle and state switches go to `info`, event traffic to `debug` and
/// exceptions to `warn`. All events carry the machine name as `machine`.
#[derive(Clone, Debug, Default)]
pub struct LoggingExtension {
    _private: (),
}

impl LoggingExtension {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Identifier, E: Identifier> Extension<S, E> for LoggingExtension {
    fn started_state_machine(&self, machine: &MachineInfo<'_, S>) {
        info!(machine = machine.name, "State machine started");
    }

    fn stopped_state_machine(&self, machine: &MachineInfo<'_, S>) {
        info!(machine = machine.name, "State machine stopped");
    }

    fn event_queued(&self, machine: &MachineInfo<'_, S>, event: &E, event_args: &EventArgs) {
        debug!(machine = machine.name, ?event, arguments = %event_args.describe(), "Event queued");
    }

    fn event_queued_with_priority(
        &self,
        machine: &MachineInfo<'_, S>,
        event: &E,
        event_args: &EventArgs,
    ) {
        debug!(machine = machine.name, ?event, arguments = %event_args.describe(), "Event queued with priority");
    }

    fn switched_state(&self, machine: &MachineInfo<'_, S>, old_state: Option<&S>, new_state: &S) {
        info!(machine = machine.name, from = ?old_state, to = ?new_state, "Switched state");
    }

    fn initialized_state_machine(&self, machine: &MachineInfo<'_, S>, initial_state: &S) {
        info!(machine = machine.name, ?initial_state, "State machine initialized");
    }

    fn entered_initial_state(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<S, E>,
    ) {
        info!(
            machine = machine.name,
            ?state,
            records = %context.records_description(),
            "Entered initial state"
        );
    }

    fn fired_event(&self, machine: &MachineInfo<'_, S>, context: &TransitionContext<S, E>) {
        debug!(
            machine = machine.name,
            event = ?context.event(),
            source = ?context.state(),
            records = %context.records_description(),
            "Fired event"
        );
    }

    fn handled_entry_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        _context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
        warn!(machine = machine.name, ?state, error = %exception, "Exception in entry action");
    }

    fn handled_exit_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        _context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
        warn!(machine = machine.name, ?state, error = %exception, "Exception in exit action");
    }

    fn handled_guard_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S, E>,
        _context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
        warn!(
            machine = machine.name,
            source = ?transition.source,
            event = ?transition.event,
            error = %exception,
            "Exception in guard"
        );
    }

    fn handled_transition_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S, E>,
        _context: &TransitionContext<S, E>,
        exception: &Exception,
    ) {
        warn!(
            machine = machine.name,
            source = ?transition.source,
            event = ?transition.event,
            target = ?transition.target,
            error = %exception,
            "Exception in transition action"
        );
    }
}
