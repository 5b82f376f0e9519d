//! The state machine runtime.
//!
//! - `StateMachine`: the engine, firing one event at a time
//! - `PassiveStateMachine`: queues events and runs them on the caller's thread
//! - `ActiveStateMachine`: runs events on a dedicated worker thread
//! - `UnitTestStateMachine`: returns declines and exceptions as errors

pub mod active;
pub mod context;
pub mod engine;
pub mod passive;
pub mod queue;
pub mod state;
pub mod transition;
pub mod unit_test;

pub use active::ActiveStateMachine;
pub use context::{Record, RecordKind, TransitionContext};
pub use engine::StateMachine;
pub use passive::PassiveStateMachine;
pub use queue::{EventInformation, EventSender};
pub use state::{State, StateIndex, StateTree};
pub use transition::{Transition, TransitionDictionary, TransitionInfo};
pub use unit_test::{UnitTestError, UnitTestStateMachine};
