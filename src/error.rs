//! Engine-level errors and the shared exception type.

use crate::builder::{DefinitionError, DefinitionErrors};
use crate::checkpoint::CheckpointError;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a user guard, action, entry or exit action.
///
/// Shared so the same value can be handed to every extension, recorded in the
/// transition context and published in notifications.
pub type Exception = Arc<anyhow::Error>;

/// Misuse of the state machine at runtime.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("State machine is already initialized")]
    AlreadyInitialized,

    #[error("State machine is not initialized. Call .initialize(state) first")]
    NotInitialized,

    #[error("State machine has not yet entered its initial state")]
    InitialStateNotEntered,

    #[error("State machine has already entered its initial state")]
    InitialStateAlreadyEntered,

    #[error("Failed to spawn state machine worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("State machine worker panicked")]
    WorkerPanicked,

    #[error("State machine worker has terminated and no longer accepts events")]
    WorkerTerminated,

    #[error(transparent)]
    Definition(#[from] DefinitionErrors),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl From<DefinitionError> for MachineError {
    fn from(error: DefinitionError) -> Self {
        Self::Definition(error.into())
    }
}

/// Result type alias using `MachineError`.
pub type Result<T> = std::result::Result<T, MachineError>;
