use std::path::PathBuf;

use thiserror::Error;

use crate::playback::state::PlaybackError;
use crate::sequence::operation::StepId;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("step {0} does not exist")]
    StepNotFound(StepId),

    /// Synthetic steps carry no context to edit
    #[error("step {0} has no element context and cannot be edited")]
    NotEditable(StepId),

    /// Every step id up to `u32::MAX` has been handed out since the last
    /// compaction
    #[error("no step ids left, compact the sequence first")]
    IdsExhausted,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize test case: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Loaded data violates the sequence invariants
    #[error("corrupt test case: {0}")]
    Corrupt(String),
}
