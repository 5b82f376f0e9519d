//! Passive execution: events are processed on the caller's thread.

use super::engine::StateMachine;
use super::queue::{EventInformation, EventSender, Message};
use crate::core::{EventArgs, Identifier};
use crate::error::{MachineError, Result};
use crate::extension::Extension;
use crate::notifier::MachineEvent;
use crate::report::ReportSink;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// State machine that runs events synchronously inside `fire` and `start`.
///
/// Events are queued first and processed in order; an event fired through
/// the `EventSender` while another event is being processed runs after it.
/// Nothing is processed until `start`, and `initialize` defers the entry of
/// the initial state to it.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::TransitionBuilder;
/// use hsm_engine::core::EventArgs;
/// use hsm_engine::{PassiveStateMachine, StateMachine};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum States { Idle, Busy }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Events { Work }
///
/// let mut definition = StateMachine::new("worker");
/// definition.add_transition(States::Idle, Events::Work, TransitionBuilder::goto(States::Busy))?;
///
/// let mut machine = PassiveStateMachine::new(definition);
/// machine.initialize(States::Idle)?;
/// machine.fire(Events::Work, EventArgs::none())?;
/// assert_eq!(machine.current_state_id(), None);
///
/// machine.start()?;
/// assert_eq!(machine.current_state_id(), Some(&States::Busy));
/// # Ok::<(), hsm_engine::MachineError>(())
/// ```
pub struct PassiveStateMachine<S: Identifier, E: Identifier> {
    machine: StateMachine<S, E>,
    queue: VecDeque<EventInformation<E>>,
    sender: EventSender<S, E>,
    inbox: mpsc::UnboundedReceiver<Message<S, E>>,
    running: bool,
    pending_initialization: bool,
}

impl<S: Identifier, E: Identifier> PassiveStateMachine<S, E> {
    /// Wrap an engine. An engine that was initialized but has not entered
    /// its initial state yet enters it on `start`.
    pub fn new(machine: StateMachine<S, E>) -> Self {
        let (sender, inbox) = EventSender::channel();
        let pending_initialization = machine.is_initialized() && !machine.has_entered_initial_state();
        Self {
            machine,
            queue: VecDeque::new(),
            sender,
            inbox,
            running: false,
            pending_initialization,
        }
    }

    pub fn machine(&self) -> &StateMachine<S, E> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine<S, E> {
        &mut self.machine
    }

    pub fn into_machine(self) -> StateMachine<S, E> {
        self.machine
    }

    pub fn name(&self) -> &str {
        self.machine.name()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_state_id(&self) -> Option<&S> {
        self.machine.current_state_id()
    }

    /// Handle for firing events from guards, actions or other threads.
    pub fn event_sender(&self) -> EventSender<S, E> {
        self.sender.clone()
    }

    /// Number of events waiting to be processed.
    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// Set the initial state; it is entered on the next `start`.
    pub fn initialize(&mut self, initial_state: S) -> Result<()> {
        self.machine.initialize(initial_state)?;
        self.pending_initialization = true;
        self.execute()
    }

    pub fn fire(&mut self, event: E, event_args: EventArgs) -> Result<()> {
        self.enqueue(EventInformation { event, event_args }, false);
        self.execute()
    }

    /// Fire `event` before all events that are already queued.
    pub fn fire_priority(&mut self, event: E, event_args: EventArgs) -> Result<()> {
        self.enqueue(EventInformation { event, event_args }, true);
        self.execute()
    }

    /// Start processing: enter the initial state if still pending, then
    /// work off the queue.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        if !self.machine.is_initialized() {
            return Err(MachineError::NotInitialized);
        }
        self.running = true;
        self.machine
            .notify_extensions(|e, info| e.started_state_machine(info));
        self.execute()
    }

    /// Stop processing. Queued events stay queued until the next `start`.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.machine
            .notify_extensions(|e, info| e.stopped_state_machine(info));
    }

    pub fn add_extension(&mut self, extension: Arc<dyn Extension<S, E>>) {
        self.machine.add_extension(extension);
    }

    pub fn remove_extension(&mut self, extension: &Arc<dyn Extension<S, E>>) -> bool {
        self.machine.remove_extension(extension)
    }

    pub fn clear_extensions(&mut self) {
        self.machine.clear_extensions();
    }

    pub fn subscribe(&mut self, handler: impl Fn(&MachineEvent<S, E>) + Send + 'static) {
        self.machine.subscribe(handler);
    }

    pub fn report(&self, sink: &mut dyn ReportSink<S, E>) {
        self.machine.report(sink);
    }

    fn enqueue(&mut self, event: EventInformation<E>, priority: bool) {
        if priority {
            self.machine.notify_extensions(|e, info| {
                e.event_queued_with_priority(info, &event.event, &event.event_args)
            });
            self.queue.push_front(event);
        } else {
            self.machine
                .notify_extensions(|e, info| e.event_queued(info, &event.event, &event.event_args));
            self.queue.push_back(event);
        }
    }

    /// Move everything sent through event senders into the queue.
    fn drain_inbox(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            match message {
                Message::Fire(event) => self.enqueue(event, false),
                Message::FirePriority(event) => self.enqueue(event, true),
                Message::Configure(change) => change(&mut self.machine),
                Message::Stop => self.stop(),
            }
        }
    }

    fn execute(&mut self) -> Result<()> {
        self.drain_inbox();
        if !self.running {
            return Ok(());
        }

        if self.pending_initialization {
            self.pending_initialization = false;
            self.machine.enter_initial_state()?;
        }

        loop {
            self.drain_inbox();
            if !self.running {
                return Ok(());
            }
            let Some(EventInformation { event, event_args }) = self.queue.pop_front() else {
                return Ok(());
            };
            self.machine.fire(event, event_args)?;
        }
    }
}

impl<S: Identifier, E: Identifier> std::fmt::Debug for PassiveStateMachine<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassiveStateMachine")
            .field("machine", &self.machine)
            .field("queued_events", &self.queue.len())
            .field("running", &self.running)
            .finish()
    }
}
