//! hsm-engine: a hierarchical, extensible state machine engine
//!
//! States form a tree: composite states own sub-states, enter them through
//! an initial sub-state and can remember the last active one (shallow or
//! deep history). Events are resolved from the current leaf outwards, and a
//! transition exits and enters exactly the states between source and target.
//!
//! # Core Concepts
//!
//! - **States and events**: any `Clone + Eq + Hash + Debug` type, usually enums
//! - **Guards and actions**: user callables wrapped in holders that check the
//!   event arguments against the callable's signature at call time
//! - **Extensions**: observers that can override the initial state, the fired
//!   event and caught exceptions
//! - **Execution modes**: passive (caller thread), active (worker thread) and
//!   unit-test (failures returned as errors)
//!
//! # Example
//!
//! ```rust
//! use hsm_engine::builder::TransitionBuilder;
//! use hsm_engine::core::{ActionHolder, GuardHolder, HistoryType};
//! use hsm_engine::{event_args, PassiveStateMachine, StateMachine};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum States { Stopped, Moving, Up, Down }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Events { GoUp, GoDown, Stop }
//!
//! let mut elevator = StateMachine::new("elevator");
//! elevator.define_hierarchy(States::Moving, States::Up, HistoryType::None, [States::Up, States::Down])?;
//! elevator.add_transition(
//!     States::Stopped,
//!     Events::GoUp,
//!     TransitionBuilder::goto(States::Up)
//!         .guard(GuardHolder::with_argument(|floor: &u8| *floor < 10).named("below_top"))
//!         .action(ActionHolder::with_argument(|floor: &u8| println!("to floor {floor}"))),
//! )?;
//! elevator.add_transition(States::Stopped, Events::GoDown, TransitionBuilder::goto(States::Down))?;
//! elevator.add_transition(States::Moving, Events::Stop, TransitionBuilder::goto(States::Stopped))?;
//!
//! let mut machine = PassiveStateMachine::new(elevator);
//! machine.initialize(States::Stopped)?;
//! machine.start()?;
//!
//! machine.fire(Events::GoUp, event_args![12u8])?;
//! assert_eq!(machine.current_state_id(), Some(&States::Stopped));
//!
//! machine.fire(Events::GoUp, event_args![3u8])?;
//! assert_eq!(machine.current_state_id(), Some(&States::Up));
//!
//! machine.fire(Events::Stop, event_args![])?;
//! assert_eq!(machine.current_state_id(), Some(&States::Stopped));
//! # Ok::<(), hsm_engine::MachineError>(())
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod error;
pub mod extension;
pub mod machine;
pub mod notifier;
pub mod report;

// Re-export commonly used types
pub use config::MachineConfig;
pub use error::{Exception, MachineError};
pub use extension::{Extension, LoggingExtension};
pub use machine::{
    ActiveStateMachine, EventSender, PassiveStateMachine, StateMachine, UnitTestError,
    UnitTestStateMachine,
};
pub use notifier::MachineEvent;
pub use report::{ReportSink, TextReport};
