//! Checkpoint and resume functionality for state machines.
//!
//! A checkpoint captures where a machine is: its initial state, its current
//! state and the last active sub-state of every composite state. Guards and
//! actions are not serializable and are not part of it; a checkpoint is
//! loaded into a machine built from the same definition.
//!
//! # Example
//!
//! ```rust
//! use hsm_engine::builder::TransitionBuilder;
//! use hsm_engine::checkpoint::Checkpoint;
//! use hsm_engine::core::EventArgs;
//! use hsm_engine::StateMachine;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
//! enum States { Draft, Review }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Events { Submit }
//!
//! fn definition() -> StateMachine<States, Events> {
//!     let mut machine = StateMachine::new("document");
//!     machine
//!         .add_transition(States::Draft, Events::Submit, TransitionBuilder::goto(States::Review))
//!         .unwrap();
//!     machine
//! }
//!
//! let mut machine = definition();
//! machine.initialize(States::Draft)?;
//! machine.enter_initial_state()?;
//! machine.fire(Events::Submit, EventArgs::none())?;
//!
//! let json = machine.save().to_json()?;
//!
//! let mut resumed = definition();
//! resumed.load(Checkpoint::from_json(&json)?)?;
//! assert_eq!(resumed.current_state_id(), Some(&States::Review));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::core::Identifier;
use crate::machine::{StateIndex, StateMachine, StateTree};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Last active sub-state remembered by a composite state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<S> {
    pub super_state: S,
    pub last_active: S,
}

/// Serializable checkpoint of a state machine's position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Name of the machine that was saved
    pub machine: String,

    pub initial_state: Option<S>,

    /// `None` if the initial state had not been entered yet
    pub current_state: Option<S>,

    pub history: Vec<HistoryEntry<S>>,
}

impl<S: Serialize + DeserializeOwned> Checkpoint<S> {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            bincode::deserialize(bytes).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }
}

impl<S> Checkpoint<S> {
    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version == CHECKPOINT_VERSION {
            Ok(())
        } else {
            Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            })
        }
    }
}

fn lookup<S: Identifier, E: Identifier>(tree: &StateTree<S, E>, id: &S) -> Result<StateIndex, CheckpointError> {
    tree.find(id)
        .ok_or_else(|| CheckpointError::ValidationFailed(format!("Unknown state {}", id.describe())))
}

impl<S: Identifier, E: Identifier> StateMachine<S, E> {
    /// Capture the current position of the machine.
    pub fn save(&self) -> Checkpoint<S> {
        let tree = self.states();
        let history = tree
            .composites()
            .filter_map(|index| {
                tree.last_active(index).map(|active| HistoryEntry {
                    super_state: tree.id(index).clone(),
                    last_active: tree.id(active).clone(),
                })
            })
            .collect();

        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            machine: self.name().to_string(),
            initial_state: self.initial_state_id().cloned(),
            current_state: self.current_state_id().cloned(),
            history,
        }
    }

    /// Restore a saved position into a machine that was not initialized yet.
    ///
    /// No entry action runs. If the checkpoint has a current state, the
    /// machine accepts events right away; otherwise it still has to enter its
    /// initial state.
    pub fn load(&mut self, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError> {
        if self.is_initialized() {
            return Err(CheckpointError::AlreadyInitialized);
        }
        checkpoint.check_version()?;

        let tree = self.states();
        let initial = match &checkpoint.initial_state {
            Some(initial) => lookup(tree, initial)?,
            None if checkpoint.current_state.is_some() => {
                return Err(CheckpointError::ValidationFailed(
                    "Checkpoint has a current state but no initial state".to_string(),
                ))
            }
            None => return Ok(()),
        };

        let current = match &checkpoint.current_state {
            Some(current) => {
                let index = lookup(tree, current)?;
                if tree.state(index).is_composite() {
                    return Err(CheckpointError::ValidationFailed(format!(
                        "Current state {} is not a leaf",
                        current.describe()
                    )));
                }
                Some(index)
            }
            None => None,
        };

        let mut history = Vec::with_capacity(checkpoint.history.len());
        for entry in &checkpoint.history {
            let super_state = lookup(tree, &entry.super_state)?;
            let last_active = lookup(tree, &entry.last_active)?;
            if tree.state(last_active).super_state != Some(super_state) {
                return Err(CheckpointError::ValidationFailed(format!(
                    "{} is not a sub-state of {}",
                    entry.last_active.describe(),
                    entry.super_state.describe()
                )));
            }
            history.push((super_state, last_active));
        }

        for (super_state, last_active) in history {
            tree.state(super_state).last_active_state.set(Some(last_active));
        }
        self.restore(initial, current);

        debug!(
            machine = %self.name(),
            checkpoint = %checkpoint.id,
            current_state = ?checkpoint.current_state,
            "Loaded checkpoint"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::core::{ActionHolder, EventArgs, HistoryType};
    use crate::machine::PassiveStateMachine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Off,
        On,
        Low,
        High,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Toggle,
        Up,
    }

    fn definition(entries: Arc<AtomicUsize>) -> StateMachine<TestState, TestEvent> {
        let mut machine = StateMachine::new("lamp");
        machine
            .define_hierarchy(TestState::On, TestState::Low, HistoryType::Shallow, [TestState::Low, TestState::High])
            .unwrap();
        machine
            .add_transition(TestState::Off, TestEvent::Toggle, TransitionBuilder::goto(TestState::On))
            .unwrap();
        machine
            .add_transition(TestState::On, TestEvent::Toggle, TransitionBuilder::goto(TestState::Off))
            .unwrap();
        machine
            .add_transition(TestState::Low, TestEvent::Up, TransitionBuilder::goto(TestState::High))
            .unwrap();
        machine.add_entry_action(
            TestState::High,
            ActionHolder::new(move || {
                entries.fetch_add(1, Ordering::SeqCst);
            }),
        );
        machine
    }

    fn saved_after_high_then_off() -> Checkpoint<TestState> {
        let mut machine = definition(Arc::new(AtomicUsize::new(0)));
        machine.initialize(TestState::Off).unwrap();
        machine.enter_initial_state().unwrap();
        machine.fire(TestEvent::Toggle, EventArgs::none()).unwrap();
        machine.fire(TestEvent::Up, EventArgs::none()).unwrap();
        machine.fire(TestEvent::Toggle, EventArgs::none()).unwrap();
        machine.save()
    }

    #[test]
    fn save_captures_position_and_history() {
        let checkpoint = saved_after_high_then_off();

        assert_eq!(checkpoint.version, CHECKPOINT_VERSION);
        assert_eq!(checkpoint.machine, "lamp");
        assert_eq!(checkpoint.initial_state, Some(TestState::Off));
        assert_eq!(checkpoint.current_state, Some(TestState::Off));
        assert_eq!(
            checkpoint.history,
            vec![HistoryEntry {
                super_state: TestState::On,
                last_active: TestState::High,
            }]
        );
    }

    #[test]
    fn load_restores_history_without_running_entry_actions() {
        let entries = Arc::new(AtomicUsize::new(0));
        let mut machine = definition(Arc::clone(&entries));
        machine.load(saved_after_high_then_off()).unwrap();

        assert_eq!(machine.current_state_id(), Some(&TestState::Off));
        assert_eq!(entries.load(Ordering::SeqCst), 0);

        machine.fire(TestEvent::Toggle, EventArgs::none()).unwrap();
        assert_eq!(machine.current_state_id(), Some(&TestState::High));
        assert_eq!(entries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn checkpoint_without_current_state_enters_initial_state_on_start() {
        let mut saved = definition(Arc::new(AtomicUsize::new(0)));
        saved.initialize(TestState::Off).unwrap();
        let checkpoint = saved.save();
        assert_eq!(checkpoint.current_state, None);

        let mut machine = definition(Arc::new(AtomicUsize::new(0)));
        machine.load(checkpoint).unwrap();
        let mut machine = PassiveStateMachine::new(machine);
        machine.fire(TestEvent::Toggle, EventArgs::none()).unwrap();
        machine.start().unwrap();

        assert_eq!(machine.current_state_id(), Some(&TestState::Low));
        assert_eq!(machine.queued_events(), 0);
    }

    #[test]
    fn json_and_binary_encodings_restore_same_checkpoint() {
        let checkpoint = saved_after_high_then_off();

        let from_json = Checkpoint::from_json(&checkpoint.to_json().unwrap()).unwrap();
        let from_bytes = Checkpoint::from_bytes(&checkpoint.to_bytes().unwrap()).unwrap();

        assert_eq!(from_json, checkpoint);
        assert_eq!(from_bytes, checkpoint);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut checkpoint = saved_after_high_then_off();
        checkpoint.version = 99;

        let result = Checkpoint::<TestState>::from_json(&checkpoint.to_json().unwrap());
        assert!(matches!(
            result,
            Err(CheckpointError::UnsupportedVersion { found: 99, supported: 1 })
        ));
    }

    #[test]
    fn rejects_load_into_initialized_machine() {
        let mut machine = definition(Arc::new(AtomicUsize::new(0)));
        machine.initialize(TestState::Off).unwrap();

        assert!(matches!(
            machine.load(saved_after_high_then_off()),
            Err(CheckpointError::AlreadyInitialized)
        ));
    }

    #[test]
    fn rejects_history_that_does_not_match_hierarchy() {
        let mut checkpoint = saved_after_high_then_off();
        checkpoint.history = vec![HistoryEntry {
            super_state: TestState::On,
            last_active: TestState::Off,
        }];

        let mut machine = definition(Arc::new(AtomicUsize::new(0)));
        assert!(matches!(
            machine.load(checkpoint),
            Err(CheckpointError::ValidationFailed(_))
        ));
        assert!(!machine.is_initialized());
    }

    #[test]
    fn rejects_composite_current_state() {
        let mut checkpoint = saved_after_high_then_off();
        checkpoint.current_state = Some(TestState::On);

        let mut machine = definition(Arc::new(AtomicUsize::new(0)));
        assert!(matches!(
            machine.load(checkpoint),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }
}
