//! Definition-time API: transition builders, hierarchy validation and
//! definition errors.
//!
//! Definitions are checked when they are made. A hierarchy definition
//! reports every problem it has at once:
//!
//! ```rust
//! use hsm_engine::core::HistoryType;
//! use hsm_engine::StateMachine;
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum States { Parent, Child, Stranger }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Events {}
//!
//! let mut machine: StateMachine<States, Events> = StateMachine::new("invalid");
//! let errors = machine
//!     .define_hierarchy(States::Parent, States::Stranger, HistoryType::None, [States::Parent, States::Child])
//!     .unwrap_err();
//! assert_eq!(errors.errors().len(), 2);
//! ```

pub mod error;
pub(crate) mod hierarchy;
pub mod macros;
pub mod transition;

pub use error::{DefinitionError, DefinitionErrors};
pub use transition::TransitionBuilder;
