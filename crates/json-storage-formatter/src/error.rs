//! Error type shared by the encoder, decoder and option profiles.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    /// JSON text could not be parsed, or the envelope tree could not be
    /// serialized.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("value nesting exceeds the maximum depth of {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("invalid regular expression /{pattern}/{flags}: {message}")]
    InvalidPattern {
        pattern: String,
        flags: String,
        message: String,
    },
    #[error("function has no callable body")]
    NotCallable,
    #[error("unknown type name: {0}")]
    UnknownTypeName(String),
}
