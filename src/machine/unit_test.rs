//! Passive machine that turns declined transitions and exceptions into
//! errors returned from `fire` and `start`.

use super::engine::StateMachine;
use super::passive::PassiveStateMachine;
use crate::core::{EventArgs, Identifier};
use crate::error::{Exception, MachineError};
use crate::notifier::MachineEvent;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// First failure observed while processing a call.
#[derive(Debug)]
pub enum UnitTestError<S, E> {
    /// No transition handled the event.
    Declined { state: S, event: E },

    /// A guard, action, entry or exit action failed.
    Exception {
        state: Option<S>,
        event: Option<E>,
        source: Exception,
    },

    /// The machine itself was misused.
    Machine(MachineError),
}

impl<S: Identifier, E: Identifier> fmt::Display for UnitTestError<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declined { state, event } => write!(
                f,
                "Transition declined: state {} does not handle event {}",
                state.describe(),
                event.describe()
            ),
            Self::Exception {
                state: Some(state),
                event: Some(event),
                source,
            } => write!(
                f,
                "Exception thrown in state {} while handling event {}: {source}",
                state.describe(),
                event.describe()
            ),
            Self::Exception { source, .. } => write!(f, "Exception thrown: {source}"),
            Self::Machine(error) => write!(f, "{error}"),
        }
    }
}

impl<S: Identifier, E: Identifier> Error for UnitTestError<S, E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Exception { source, .. } => {
                let source: &anyhow::Error = source;
                Some(&**source)
            }
            Self::Machine(error) => Some(error),
            Self::Declined { .. } => None,
        }
    }
}

impl<S, E> From<MachineError> for UnitTestError<S, E> {
    fn from(error: MachineError) -> Self {
        Self::Machine(error)
    }
}

type Failures<S, E> = Arc<Mutex<Vec<UnitTestError<S, E>>>>;

/// Passive state machine for tests: the first decline or exception of a
/// call is returned as `Err`.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::EventArgs;
/// use hsm_engine::{StateMachine, UnitTestError, UnitTestStateMachine};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum States { Idle }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Events { Unknown }
///
/// let mut machine = UnitTestStateMachine::new(StateMachine::new("test"));
/// machine.initialize(States::Idle).unwrap();
/// machine.start().unwrap();
///
/// let error = machine.fire(Events::Unknown, EventArgs::none()).unwrap_err();
/// assert!(matches!(error, UnitTestError::Declined { .. }));
/// ```
pub struct UnitTestStateMachine<S: Identifier, E: Identifier> {
    machine: PassiveStateMachine<S, E>,
    failures: Failures<S, E>,
}

impl<S: Identifier, E: Identifier> UnitTestStateMachine<S, E> {
    pub fn new(mut machine: StateMachine<S, E>) -> Self {
        let failures: Failures<S, E> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        machine.subscribe(move |event| {
            let failure = match event {
                MachineEvent::TransitionDeclined { state, event, .. } => UnitTestError::Declined {
                    state: state.clone(),
                    event: event.clone(),
                },
                MachineEvent::ExceptionThrown { state, exception } => UnitTestError::Exception {
                    state: state.clone(),
                    event: None,
                    source: Arc::clone(exception),
                },
                MachineEvent::TransitionExceptionThrown {
                    state,
                    event,
                    exception,
                    ..
                } => UnitTestError::Exception {
                    state: Some(state.clone()),
                    event: Some(event.clone()),
                    source: Arc::clone(exception),
                },
                _ => return,
            };
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(failure);
        });

        Self {
            machine: PassiveStateMachine::new(machine),
            failures,
        }
    }

    pub fn passive(&self) -> &PassiveStateMachine<S, E> {
        &self.machine
    }

    pub fn passive_mut(&mut self) -> &mut PassiveStateMachine<S, E> {
        &mut self.machine
    }

    pub fn current_state_id(&self) -> Option<&S> {
        self.machine.current_state_id()
    }

    pub fn initialize(&mut self, initial_state: S) -> Result<(), UnitTestError<S, E>> {
        self.checked(|machine| machine.initialize(initial_state))
    }

    pub fn start(&mut self) -> Result<(), UnitTestError<S, E>> {
        self.checked(PassiveStateMachine::start)
    }

    pub fn stop(&mut self) {
        self.machine.stop();
    }

    pub fn fire(&mut self, event: E, event_args: EventArgs) -> Result<(), UnitTestError<S, E>> {
        self.checked(|machine| machine.fire(event, event_args))
    }

    pub fn fire_priority(&mut self, event: E, event_args: EventArgs) -> Result<(), UnitTestError<S, E>> {
        self.checked(|machine| machine.fire_priority(event, event_args))
    }

    fn checked(
        &mut self,
        call: impl FnOnce(&mut PassiveStateMachine<S, E>) -> crate::error::Result<()>,
    ) -> Result<(), UnitTestError<S, E>> {
        self.take_failures();
        call(&mut self.machine)?;
        match self.take_failures().into_iter().next() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn take_failures(&self) -> Vec<UnitTestError<S, E>> {
        std::mem::take(&mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::core::ActionHolder;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        A,
        B,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Go,
        Fail,
        Unknown,
    }

    fn machine() -> UnitTestStateMachine<TestState, TestEvent> {
        let mut definition = StateMachine::new("unit");
        definition
            .add_transition(TestState::A, TestEvent::Go, TransitionBuilder::goto(TestState::B))
            .unwrap();
        definition
            .add_transition(
                TestState::A,
                TestEvent::Fail,
                TransitionBuilder::internal().action(ActionHolder::new(|| -> anyhow::Result<()> {
                    anyhow::bail!("boom")
                })),
            )
            .unwrap();
        let mut machine = UnitTestStateMachine::new(definition);
        machine.initialize(TestState::A).unwrap();
        machine.start().unwrap();
        machine
    }

    #[test]
    fn successful_fire_is_ok() {
        let mut machine = machine();
        machine.fire(TestEvent::Go, EventArgs::none()).unwrap();
        assert_eq!(machine.current_state_id(), Some(&TestState::B));
    }

    #[test]
    fn declined_transition_is_an_error() {
        let mut machine = machine();
        let error = machine.fire(TestEvent::Unknown, EventArgs::none()).unwrap_err();

        assert!(matches!(
            error,
            UnitTestError::Declined {
                state: TestState::A,
                event: TestEvent::Unknown
            }
        ));
        assert_eq!(
            error.to_string(),
            "Transition declined: state A does not handle event Unknown"
        );
    }

    #[test]
    fn exception_keeps_original_error_as_source() {
        let mut machine = machine();
        let error = machine.fire(TestEvent::Fail, EventArgs::none()).unwrap_err();

        assert_eq!(error.source().unwrap().to_string(), "boom");
        assert!(matches!(
            error,
            UnitTestError::Exception {
                event: Some(TestEvent::Fail),
                ..
            }
        ));
    }

    #[test]
    fn failures_do_not_leak_into_next_call() {
        let mut machine = machine();
        assert!(machine.fire(TestEvent::Unknown, EventArgs::none()).is_err());
        assert!(machine.fire(TestEvent::Go, EventArgs::none()).is_ok());
    }
}
