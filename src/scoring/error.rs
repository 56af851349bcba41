use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
