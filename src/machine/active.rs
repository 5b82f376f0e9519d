//! Active execution: a dedicated worker thread owns the engine.
//!
//! The handle and the worker only share the message channel and a watch
//! channel publishing the current state.

use super::engine::StateMachine;
use super::queue::{EventInformation, EventSender, Message};
use crate::core::{EventArgs, Identifier};
use crate::error::{MachineError, Result};
use crate::extension::Extension;
use crate::notifier::MachineEvent;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Everything the worker thread owns while running.
struct Worker<S: Identifier, E: Identifier> {
    machine: StateMachine<S, E>,
    inbox: mpsc::UnboundedReceiver<Message<S, E>>,
    queue: VecDeque<EventInformation<E>>,
    pending_initialization: bool,
    state: watch::Sender<Option<S>>,
}

enum Runtime<S: Identifier, E: Identifier> {
    Stopped(Box<Worker<S, E>>),
    Running(JoinHandle<Worker<S, E>>),
    /// The worker panicked or could not be spawned; the engine is gone.
    Terminated,
}

impl<S: Identifier, E: Identifier> Worker<S, E> {
    /// Process messages until a stop request has been handled.
    ///
    /// Events accepted before the stop request are fired before returning;
    /// anything sent later stays in the channel for the next run.
    fn run(mut self) -> Self {
        self.machine
            .notify_extensions(|e, info| e.started_state_machine(info));

        if self.pending_initialization {
            self.pending_initialization = false;
            if let Err(error) = self.machine.enter_initial_state() {
                warn!(machine = %self.machine.name(), %error, "Failed to enter initial state");
            }
            self.publish();
        }

        let mut stopping = false;
        loop {
            while !stopping {
                match self.inbox.try_recv() {
                    Ok(message) => stopping = self.accept(message),
                    Err(_) => break,
                }
            }

            if let Some(EventInformation { event, event_args }) = self.queue.pop_front() {
                if let Err(error) = self.machine.fire(event, event_args) {
                    warn!(machine = %self.machine.name(), %error, "Failed to fire event");
                }
                self.publish();
                continue;
            }

            if stopping {
                break;
            }
            match self.inbox.blocking_recv() {
                Some(message) => stopping = self.accept(message),
                None => break,
            }
        }

        self.machine
            .notify_extensions(|e, info| e.stopped_state_machine(info));
        self
    }

    /// Returns whether the message was a stop request.
    fn accept(&mut self, message: Message<S, E>) -> bool {
        match message {
            Message::Fire(event) => {
                self.machine
                    .notify_extensions(|e, info| e.event_queued(info, &event.event, &event.event_args));
                self.queue.push_back(event);
            }
            Message::FirePriority(event) => {
                self.machine.notify_extensions(|e, info| {
                    e.event_queued_with_priority(info, &event.event, &event.event_args)
                });
                self.queue.push_front(event);
            }
            Message::Configure(change) => {
                change(&mut self.machine);
                self.publish();
            }
            Message::Stop => return true,
        }
        false
    }

    fn publish(&self) {
        self.state
            .send_replace(self.machine.current_state_id().cloned());
    }
}

/// State machine that processes events on its own worker thread.
///
/// `fire` only queues the event and returns. The worker is spawned by
/// `start` and joined by `stop`; dropping a running machine stops it.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::TransitionBuilder;
/// use hsm_engine::core::EventArgs;
/// use hsm_engine::{ActiveStateMachine, StateMachine};
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
/// let mut machine = ActiveStateMachine::new(definition);
/// machine.initialize(States::Idle)?;
/// machine.start()?;
/// machine.fire(Events::Work, EventArgs::none())?;
/// machine.stop()?;
///
/// assert_eq!(machine.current_state_id(), Some(States::Busy));
/// # Ok::<(), hsm_engine::MachineError>(())
/// ```
pub struct ActiveStateMachine<S: Identifier, E: Identifier> {
    name: String,
    thread_name: String,
    sender: EventSender<S, E>,
    state: watch::Receiver<Option<S>>,
    initialized: bool,
    runtime: Runtime<S, E>,
}

impl<S: Identifier, E: Identifier> ActiveStateMachine<S, E> {
    pub fn new(machine: StateMachine<S, E>) -> Self {
        let (sender, inbox) = EventSender::channel();
        let (state_sender, state) = watch::channel(machine.current_state_id().cloned());
        let pending_initialization = machine.is_initialized() && !machine.has_entered_initial_state();
        Self {
            name: machine.name().to_string(),
            thread_name: machine.config().worker_thread_name(),
            sender,
            state,
            initialized: machine.is_initialized(),
            runtime: Runtime::Stopped(Box::new(Worker {
                machine,
                inbox,
                queue: VecDeque::new(),
                pending_initialization,
                state: state_sender,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        matches!(self.runtime, Runtime::Running(_))
    }

    /// Last state published by the worker.
    pub fn current_state_id(&self) -> Option<S> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state the worker publishes.
    pub fn state_receiver(&self) -> watch::Receiver<Option<S>> {
        self.state.clone()
    }

    pub fn event_sender(&self) -> EventSender<S, E> {
        self.sender.clone()
    }

    /// The engine, while the worker is not running.
    pub fn machine(&self) -> Option<&StateMachine<S, E>> {
        match &self.runtime {
            Runtime::Stopped(worker) => Some(&worker.machine),
            _ => None,
        }
    }

    pub fn machine_mut(&mut self) -> Option<&mut StateMachine<S, E>> {
        match &mut self.runtime {
            Runtime::Stopped(worker) => Some(&mut worker.machine),
            _ => None,
        }
    }

    /// Set the initial state; the worker enters it when it starts.
    pub fn initialize(&mut self, initial_state: S) -> Result<()> {
        if self.initialized {
            return Err(MachineError::AlreadyInitialized);
        }

        match &mut self.runtime {
            Runtime::Stopped(worker) => {
                worker.machine.initialize(initial_state)?;
                worker.pending_initialization = true;
                self.initialized = true;
                Ok(())
            }
            // A running worker implies an initialized machine.
            Runtime::Running(_) => Err(MachineError::AlreadyInitialized),
            Runtime::Terminated => Err(MachineError::WorkerTerminated),
        }
    }

    pub fn fire(&self, event: E, event_args: EventArgs) -> Result<()> {
        self.sender.fire(event, event_args)
    }

    pub fn fire_priority(&self, event: E, event_args: EventArgs) -> Result<()> {
        self.sender.fire_priority(event, event_args)
    }

    /// Spawn the worker thread.
    pub fn start(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(MachineError::NotInitialized);
        }

        let worker = match std::mem::replace(&mut self.runtime, Runtime::Terminated) {
            Runtime::Stopped(worker) => *worker,
            running @ Runtime::Running(_) => {
                self.runtime = running;
                return Ok(());
            }
            Runtime::Terminated => return Err(MachineError::WorkerTerminated),
        };

        debug!(machine = %self.name, thread = %self.thread_name, "Starting worker");
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || worker.run())?;
        self.runtime = Runtime::Running(handle);
        Ok(())
    }

    /// Ask the worker to stop and wait for it.
    ///
    /// Events queued before this call are processed first.
    pub fn stop(&mut self) -> Result<()> {
        let handle = match std::mem::replace(&mut self.runtime, Runtime::Terminated) {
            Runtime::Running(handle) => handle,
            other => {
                self.runtime = other;
                return Ok(());
            }
        };

        self.sender.stop()?;
        match handle.join() {
            Ok(worker) => {
                self.runtime = Runtime::Stopped(Box::new(worker));
                debug!(machine = %self.name, "Worker stopped");
                Ok(())
            }
            Err(_) => Err(MachineError::WorkerPanicked),
        }
    }

    pub fn add_extension(&mut self, extension: Arc<dyn Extension<S, E>>) -> Result<()> {
        self.configure(move |machine| machine.add_extension(extension))
    }

    pub fn remove_extension(&mut self, extension: &Arc<dyn Extension<S, E>>) -> Result<()> {
        let extension = Arc::clone(extension);
        self.configure(move |machine| {
            machine.remove_extension(&extension);
        })
    }

    pub fn clear_extensions(&mut self) -> Result<()> {
        self.configure(|machine| machine.clear_extensions())
    }

    /// Subscribe to machine events. Handlers run on the worker thread.
    pub fn subscribe(&mut self, handler: impl Fn(&MachineEvent<S, E>) + Send + 'static) -> Result<()> {
        self.configure(move |machine| machine.subscribe(handler))
    }

    /// Apply `change` directly when stopped, on the worker when running.
    fn configure(&mut self, change: impl FnOnce(&mut StateMachine<S, E>) + Send + 'static) -> Result<()> {
        match &mut self.runtime {
            Runtime::Stopped(worker) => {
                change(&mut worker.machine);
                Ok(())
            }
            Runtime::Running(_) => self.sender.configure(Box::new(change)),
            Runtime::Terminated => Err(MachineError::WorkerTerminated),
        }
    }
}

impl<S: Identifier, E: Identifier> Drop for ActiveStateMachine<S, E> {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            warn!(machine = %self.name, %error, "Worker did not stop cleanly");
        }
    }
}

impl<S: Identifier, E: Identifier> std::fmt::Debug for ActiveStateMachine<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveStateMachine")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("current_state", &*self.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::config::MachineConfig;
    use crate::core::ActionHolder;
    use std::sync::Mutex;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        A,
        B,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Toggle,
    }

    fn definition(config: MachineConfig) -> StateMachine<TestState, TestEvent> {
        let mut machine = StateMachine::with_config(config);
        machine
            .add_transition(TestState::A, TestEvent::Toggle, TransitionBuilder::goto(TestState::B))
            .unwrap();
        machine
            .add_transition(TestState::B, TestEvent::Toggle, TransitionBuilder::goto(TestState::A))
            .unwrap();
        machine
    }

    #[test]
    fn start_requires_initialization() {
        let mut machine = ActiveStateMachine::new(definition(MachineConfig::default()));
        assert!(matches!(machine.start(), Err(MachineError::NotInitialized)));
    }

    #[test]
    fn engine_initialized_before_wrapping_enters_initial_state_on_start() {
        let mut definition = definition(MachineConfig::default());
        definition.initialize(TestState::A).unwrap();

        let mut machine = ActiveStateMachine::new(definition);
        machine.fire(TestEvent::Toggle, EventArgs::none()).unwrap();
        machine.start().unwrap();
        machine.stop().unwrap();

        assert_eq!(machine.current_state_id(), Some(TestState::B));
    }

    #[test]
    fn worker_uses_configured_thread_name() {
        let threads = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&threads);
        let mut definition = definition(MachineConfig::named("toggle").with_worker_thread_name("toggle-loop"));
        definition.add_entry_action(
            TestState::B,
            ActionHolder::new(move || {
                let name = thread::current().name().map(str::to_string);
                seen.lock().unwrap().push(name);
            }),
        );

        let mut machine = ActiveStateMachine::new(definition);
        machine.initialize(TestState::A).unwrap();
        machine.start().unwrap();
        machine.fire(TestEvent::Toggle, EventArgs::none()).unwrap();
        machine.stop().unwrap();

        assert_eq!(*threads.lock().unwrap(), vec![Some("toggle-loop".to_string())]);
    }

    #[test]
    fn machine_is_only_reachable_while_stopped() {
        let mut machine = ActiveStateMachine::new(definition(MachineConfig::default()));
        machine.initialize(TestState::A).unwrap();
        assert!(machine.machine().is_some());

        machine.start().unwrap();
        assert!(machine.machine().is_none());
        assert!(machine.is_running());

        machine.stop().unwrap();
        assert!(machine.machine_mut().is_some());
        assert_eq!(machine.current_state_id(), Some(TestState::A));
    }

    #[test]
    fn second_initialize_fails() {
        let mut machine = ActiveStateMachine::new(definition(MachineConfig::default()));
        machine.initialize(TestState::A).unwrap();
        assert!(matches!(
            machine.initialize(TestState::B),
            Err(MachineError::AlreadyInitialized)
        ));
    }
}
