//! Error types for the flow engine.

use cf_core::{CoreError, MessageId};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while running a flow.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The walker hit its depth bound; the script loops without a stop.
    #[error("walk from message {start} exceeded {max_depth} steps")]
    MaxDepthExceeded {
        /// Where the walk started.
        start: MessageId,
        /// The configured bound.
        max_depth: usize,
    },

    /// A response arrived before any sequence was loaded.
    #[error("no active sequence")]
    NoActiveSequence,

    /// The message does not exist in the active sequence.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// A data action could not be applied.
    #[error("invalid data action on \"{key}\": {reason}")]
    InvalidAction {
        /// The action's key.
        key: String,
        /// What went wrong.
        reason: String,
    },

    /// A user response does not fit the message it answers.
    #[error("invalid response to message {message_id}: {reason}")]
    InvalidResponse {
        /// The message being answered.
        message_id: MessageId,
        /// What went wrong.
        reason: String,
    },

    /// Loading a sequence or touching state failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
