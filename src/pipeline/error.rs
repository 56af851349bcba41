use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::encoding::EncodingError;
use crate::reader::{ReaderError, ReaderKind};
use crate::scoring::ScoringError;

/// Construction failures. No reader exists after one of these.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scoring setup failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("encoder error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Per-call failures. A failed call never yields a partial bundle.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("inference timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("inference cancelled")]
    Cancelled,

    #[error("{kind} reader task failed: {reason}")]
    TaskFailed { kind: ReaderKind, reason: String },
}

impl InferenceError {
    /// `true` for failures caused by the input itself.
    pub fn is_input_error(&self) -> bool {
        matches!(self, InferenceError::Encoding(_))
    }
}
