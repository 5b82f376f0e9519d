//! Building blocks shared by the whole engine.
//!
//! This module contains the value types the state machine is defined with:
//! - The `Identifier` bound for state and event ids
//! - Heterogeneous event arguments with stored type tags
//! - Guard and action holders that validate arguments at call time
//! - The history policy of composite states

mod action;
mod args;
mod callable;
mod guard;
mod history;
mod identifier;

pub use action::ActionHolder;
pub use args::{Argument, ArgumentError, EventArgs};
pub use callable::{ActionOutcome, GuardOutcome, Signature};
pub use guard::GuardHolder;
pub use history::HistoryType;
pub use identifier::Identifier;
