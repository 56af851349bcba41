//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`ReaderConfig`](super::ReaderConfig).
///
/// All of these are fatal at load time: a reader is never constructed from a
/// config that fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The verification threshold was not supplied.
    #[error("missing verification threshold (set `threshold` or RETRO_THRESHOLD)")]
    MissingThreshold,

    /// The verification threshold is NaN or infinite.
    #[error("invalid verification threshold: {value} (must be finite)")]
    InvalidThreshold { value: f32 },

    /// A numeric or enumerated setting is out of range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// An environment variable held a value that could not be parsed.
    #[error("failed to parse environment variable {name}='{value}': {reason}")]
    InvalidEnvVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The configuration document could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid YAML for [`ReaderConfig`](super::ReaderConfig).
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
