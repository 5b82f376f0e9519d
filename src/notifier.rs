//! Observable events published by a state machine.
//!
//! Subscribers are plain callbacks; they run synchronously on the thread that
//! processes the event (the worker thread of an active machine).

use crate::core::{EventArgs, Identifier};
use crate::error::Exception;
use crate::machine::TransitionContext;

/// Something that happened inside the machine.
#[derive(Clone, Debug)]
pub enum MachineEvent<S, E> {
    /// A transition passed its guard and is about to execute.
    TransitionBegin {
        state: S,
        event: E,
        event_args: EventArgs,
    },

    /// A fired event was handled by a transition.
    TransitionCompleted {
        state: S,
        event: E,
        event_args: EventArgs,
        new_state: S,
        records: String,
    },

    /// No transition handled the event; the state is unchanged.
    TransitionDeclined {
        state: S,
        event: E,
        event_args: EventArgs,
    },

    /// An entry or exit action failed while entering the initial state.
    ExceptionThrown {
        state: Option<S>,
        exception: Exception,
    },

    /// A guard, action, entry or exit action failed while firing an event.
    TransitionExceptionThrown {
        state: S,
        event: E,
        event_args: EventArgs,
        exception: Exception,
    },
}

impl<S, E> MachineEvent<S, E> {
    /// The exception carried by `ExceptionThrown` / `TransitionExceptionThrown`.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Self::ExceptionThrown { exception, .. }
            | Self::TransitionExceptionThrown { exception, .. } => Some(exception),
            _ => None,
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, Self::TransitionDeclined { .. })
    }
}

pub type EventHandler<S, E> = Box<dyn Fn(&MachineEvent<S, E>) + Send>;

/// Subscriber list plus helpers that build events from a context.
pub(crate) struct Notifier<S, E> {
    handlers: Vec<EventHandler<S, E>>,
}

impl<S, E> Default for Notifier<S, E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<S: Identifier, E: Identifier> Notifier<S, E> {
    pub fn subscribe(&mut self, handler: EventHandler<S, E>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    fn publish(&self, event: MachineEvent<S, E>) {
        for handler in &self.handlers {
            handler(&event);
        }
    }

    fn event_parts(context: &TransitionContext<S, E>) -> Option<(S, E, EventArgs)> {
        let state = context.state()?.clone();
        let event = context.event()?.clone();
        Some((state, event, context.event_args().clone()))
    }

    pub fn transition_begin(&self, context: &TransitionContext<S, E>) {
        if let Some((state, event, event_args)) = Self::event_parts(context) {
            self.publish(MachineEvent::TransitionBegin {
                state,
                event,
                event_args,
            });
        }
    }

    pub fn transition_completed(&self, context: &TransitionContext<S, E>, new_state: &S) {
        if let Some((state, event, event_args)) = Self::event_parts(context) {
            self.publish(MachineEvent::TransitionCompleted {
                state,
                event,
                event_args,
                new_state: new_state.clone(),
                records: context.records_description(),
            });
        }
    }

    pub fn transition_declined(&self, context: &TransitionContext<S, E>) {
        if let Some((state, event, event_args)) = Self::event_parts(context) {
            self.publish(MachineEvent::TransitionDeclined {
                state,
                event,
                event_args,
            });
        }
    }

    /// Report a caught exception: as a transition exception while firing an
    /// event, as a plain exception otherwise.
    pub fn exception(&self, context: &TransitionContext<S, E>, exception: Exception) {
        match Self::event_parts(context) {
            Some((state, event, event_args)) => {
                self.publish(MachineEvent::TransitionExceptionThrown {
                    state,
                    event,
                    event_args,
                    exception,
                })
            }
            None => self.publish(MachineEvent::ExceptionThrown {
                state: context.state().cloned(),
                exception,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        A,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Go,
    }

    fn recording_notifier() -> (Notifier<TestState, TestEvent>, Arc<Mutex<Vec<MachineEvent<TestState, TestEvent>>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut notifier = Notifier::default();
        notifier.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
        (notifier, events)
    }

    #[test]
    fn exception_during_fire_is_transition_exception() {
        let (notifier, events) = recording_notifier();
        let context = TransitionContext::for_event(TestState::A, TestEvent::Go, EventArgs::none());

        notifier.exception(&context, Arc::new(anyhow::anyhow!("guard failed")));

        let events = events.lock().unwrap();
        assert!(matches!(
            &events[..],
            [MachineEvent::TransitionExceptionThrown { state: TestState::A, .. }]
        ));
        assert_eq!(events[0].exception().unwrap().to_string(), "guard failed");
    }

    #[test]
    fn exception_during_initial_entry_is_plain_exception() {
        let (notifier, events) = recording_notifier();
        let context = TransitionContext::for_initial_state();

        notifier.exception(&context, Arc::new(anyhow::anyhow!("entry failed")));

        let events = events.lock().unwrap();
        assert!(matches!(&events[..], [MachineEvent::ExceptionThrown { state: None, .. }]));
    }

    #[test]
    fn declined_event_is_published_once_per_call() {
        let (notifier, events) = recording_notifier();
        let context = TransitionContext::for_event(TestState::A, TestEvent::Go, EventArgs::none());

        notifier.transition_declined(&context);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_declined());
        assert!(events[0].exception().is_none());
    }

    #[test]
    fn every_subscriber_is_called() {
        let (mut notifier, first) = recording_notifier();
        let second = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&second);
        notifier.subscribe(Box::new(move |_| *counter.lock().unwrap() += 1));

        let context = TransitionContext::for_event(TestState::A, TestEvent::Go, EventArgs::none());
        notifier.transition_begin(&context);

        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
        assert_eq!(notifier.len(), 2);
    }
}
