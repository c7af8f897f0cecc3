//! Checkpoint and resume for instance state.
//!
//! A checkpoint captures where an instance is, not how it got there: the
//! engine, handlers, consumer context and timers are not serializable and
//! must be rebuilt by the caller before restoring. Pending timers are not
//! captured; re-arm them after restoring if needed.

use crate::core::StateId;
use crate::engine::FsmInstance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one instance's current state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Instance the checkpoint was taken from
    pub instance: Uuid,

    /// When the checkpoint was taken
    pub timestamp: DateTime<Utc>,

    pub state: StateId,

    /// Display name of `state` at checkpoint time. Empty when unnamed.
    pub state_name: String,
}

impl InstanceCheckpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}

impl<C, A> FsmInstance<C, A> {
    /// Snapshot the current state.
    pub fn checkpoint(&self) -> InstanceCheckpoint {
        InstanceCheckpoint {
            version: CHECKPOINT_VERSION,
            instance: self.id(),
            timestamp: Utc::now(),
            state: self.state(),
            state_name: self
                .engine()
                .state_names()
                .get(self.state().index())
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Move this instance to the checkpointed state.
    ///
    /// The checkpoint must match [`CHECKPOINT_VERSION`], its state must be
    /// in range for this instance's engine, and a recorded state name must
    /// agree with the engine's name for that state. The restore is reported
    /// to the debug sink like any other transition. The instance keeps its
    /// own id.
    pub fn restore_checkpoint(
        &mut self,
        checkpoint: &InstanceCheckpoint,
    ) -> Result<(), CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let state_count = self.engine().state_count();
        if checkpoint.state.index() >= state_count {
            return Err(CheckpointError::StateOutOfRange {
                state: checkpoint.state,
                state_count,
            });
        }

        if let Some(current) = self.engine().state_names().get(checkpoint.state.index()) {
            if !checkpoint.state_name.is_empty() && checkpoint.state_name != current {
                return Err(CheckpointError::ValidationFailed(format!(
                    "state {} is named `{}` here, checkpoint says `{}`",
                    checkpoint.state, current, checkpoint.state_name
                )));
            }
        }

        tracing::debug!(
            instance = %self.id(),
            source = %checkpoint.instance,
            state = %checkpoint.state,
            "Restoring checkpoint"
        );
        self.transition(checkpoint.state);
        Ok(())
    }
}
