use std::path::PathBuf;

use crate::message::MessageId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while loading sequences or touching persisted state.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No sequence with this id is known to the source.
    #[error("sequence not found: \"{0}\"")]
    SequenceNotFound(String),

    /// Two messages in one sequence share an id.
    #[error("sequence \"{sequence}\" has duplicate message id {id}")]
    DuplicateMessageId {
        /// The offending sequence.
        sequence: String,
        /// The repeated message id.
        id: MessageId,
    },

    /// A sequence failed structural validation.
    #[error("invalid sequence \"{sequence}\": {reason}")]
    InvalidSequence {
        /// The offending sequence.
        sequence: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A state key was empty or otherwise unusable.
    #[error("invalid state key: \"{0}\"")]
    InvalidKey(String),

    /// Filesystem access failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or written.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
