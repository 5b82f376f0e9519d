//! Messages shared by the queued execution modes.

use super::engine::StateMachine;
use crate::core::{EventArgs, Identifier};
use crate::error::{MachineError, Result};
use tokio::sync::mpsc;

/// An event waiting to be fired.
#[derive(Clone, Debug)]
pub struct EventInformation<E> {
    pub event: E,
    pub event_args: EventArgs,
}

pub(crate) type Configure<S, E> = Box<dyn FnOnce(&mut StateMachine<S, E>) + Send>;

pub(crate) enum Message<S: Identifier, E: Identifier> {
    Fire(EventInformation<E>),
    FirePriority(EventInformation<E>),
    /// Change extensions or subscribers on the thread that owns the engine.
    Configure(Configure<S, E>),
    Stop,
}

/// Cloneable handle for queuing events, usable from any thread and from
/// inside guards and actions.
///
/// Events sent while the machine is processing another event are fired after
/// that event completes.
pub struct EventSender<S: Identifier, E: Identifier> {
    sender: mpsc::UnboundedSender<Message<S, E>>,
}

impl<S: Identifier, E: Identifier> Clone for EventSender<S, E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S: Identifier, E: Identifier> EventSender<S, E> {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Message<S, E>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue `event` behind all events queued so far.
    pub fn fire(&self, event: E, event_args: EventArgs) -> Result<()> {
        self.send(Message::Fire(EventInformation { event, event_args }))
    }

    /// Queue `event` in front of all events not yet processed.
    pub fn fire_priority(&self, event: E, event_args: EventArgs) -> Result<()> {
        self.send(Message::FirePriority(EventInformation { event, event_args }))
    }

    pub(crate) fn configure(&self, change: Configure<S, E>) -> Result<()> {
        self.send(Message::Configure(change))
    }

    pub(crate) fn stop(&self) -> Result<()> {
        self.send(Message::Stop)
    }

    fn send(&self, message: Message<S, E>) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| MachineError::WorkerTerminated)
    }
}

impl<S: Identifier, E: Identifier> std::fmt::Debug for EventSender<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
