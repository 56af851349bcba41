use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("unsupported checkpoint: {reason}")]
    Unsupported { reason: String },

    #[error("forward pass failed: {reason}")]
    InferenceFailed { reason: String },
}

impl From<candle_core::Error> for ModelError {
    fn from(err: candle_core::Error) -> Self {
        ModelError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
