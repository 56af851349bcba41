use thiserror::Error;

use crate::model::ModelError;

use super::types::ReaderKind;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("{kind} reader produced invalid output: {reason}")]
    InvalidOutput { kind: ReaderKind, reason: String },

    #[error("expected a {expected} reader, got a {actual} reader")]
    KindMismatch {
        expected: ReaderKind,
        actual: ReaderKind,
    },
}
