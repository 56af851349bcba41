//! Reader configuration.
//!
//! A [`ReaderConfig`] is read once at load time, either from a YAML document
//! ([`ReaderConfig::from_yaml_file`]) or from `RETRO_*` environment variables
//! ([`ReaderConfig::from_env`]), and is immutable for the lifetime of the
//! loaded reader. Environment variables can also be layered on top of a file
//! with [`ReaderConfig::apply_env_overrides`].

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BETA_EXT, DEFAULT_BETA_INT, DEFAULT_MAX_ANSWER_LENGTH, DEFAULT_MAX_SEQ_LEN,
    DEFAULT_MODEL_NAME, DEFAULT_N_BEST_SIZE, DEFAULT_TIMEOUT_MS, DEFAULT_TOP_K,
    DEFAULT_VERIFICATION_THRESHOLD, Language,
};

/// Smallest sequence length that still leaves room for specials, a query token and a context token.
pub const MIN_SEQ_LEN: usize = 8;

/// How the rear verifier combines the two answerability signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombinerConfig {
    /// `score_ext - null_margin`.
    Direct,
    /// `beta_ext * score_ext - beta_int * null_margin`.
    Weighted { beta_ext: f32, beta_int: f32 },
}

impl Default for CombinerConfig {
    fn default() -> Self {
        CombinerConfig::Weighted {
            beta_ext: DEFAULT_BETA_EXT,
            beta_int: DEFAULT_BETA_INT,
        }
    }
}

impl CombinerConfig {
    /// Checks that weights keep the combination monotonic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let CombinerConfig::Weighted { beta_ext, beta_int } = *self {
            for (field, beta) in [("combiner.beta_ext", beta_ext), ("combiner.beta_int", beta_int)]
            {
                if !beta.is_finite() || beta < 0.0 {
                    return Err(ConfigError::InvalidValue {
                        field,
                        reason: format!("weight must be finite and >= 0, got {beta}"),
                    });
                }
            }
            if beta_ext == 0.0 && beta_int == 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "combiner",
                    reason: "at least one weight must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration of one loaded retrospective reader.
///
/// Model paths left unset run the corresponding reader in stub mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Identifier the reader is registered under.
    pub model_name: String,

    /// Sketch reader checkpoint directory (`config.json` + `model.safetensors`).
    pub sketch_model_path: Option<PathBuf>,

    /// Intensive reader checkpoint directory.
    pub intensive_model_path: Option<PathBuf>,

    /// `tokenizer.json` or a directory containing it. Falls back to the
    /// sketch, then intensive, model directory.
    pub tokenizer_path: Option<PathBuf>,

    /// Verification threshold `τ`. Required; a document without it is rejected.
    #[serde(default)]
    pub threshold: Option<f32>,

    /// Start/end positions kept when pruning the span surface (N).
    pub n_best_size: usize,

    /// Predictions returned in the n-best list (K).
    pub top_k: usize,

    /// Longest answer span, in tokens.
    pub max_answer_length: usize,

    /// Longest encoded sequence.
    pub max_seq_length: usize,

    /// Wall-clock budget for one inference call.
    pub timeout_ms: u64,

    pub combiner: CombinerConfig,

    /// Which example set the demo surface shows.
    pub language: Language,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            sketch_model_path: None,
            intensive_model_path: None,
            tokenizer_path: None,
            threshold: Some(DEFAULT_VERIFICATION_THRESHOLD),
            n_best_size: DEFAULT_N_BEST_SIZE,
            top_k: DEFAULT_TOP_K,
            max_answer_length: DEFAULT_MAX_ANSWER_LENGTH,
            max_seq_length: DEFAULT_MAX_SEQ_LEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            combiner: CombinerConfig::default(),
            language: Language::default(),
        }
    }
}

impl ReaderConfig {
    pub const ENV_CONFIG_PATH: &'static str = "RETRO_CONFIG";
    const ENV_MODEL_NAME: &'static str = "RETRO_MODEL_NAME";
    const ENV_SKETCH_MODEL_PATH: &'static str = "RETRO_SKETCH_MODEL_PATH";
    const ENV_INTENSIVE_MODEL_PATH: &'static str = "RETRO_INTENSIVE_MODEL_PATH";
    const ENV_TOKENIZER_PATH: &'static str = "RETRO_TOKENIZER_PATH";
    const ENV_THRESHOLD: &'static str = "RETRO_THRESHOLD";
    const ENV_N_BEST_SIZE: &'static str = "RETRO_N_BEST_SIZE";
    const ENV_TOP_K: &'static str = "RETRO_TOP_K";
    const ENV_MAX_ANSWER_LENGTH: &'static str = "RETRO_MAX_ANSWER_LENGTH";
    const ENV_MAX_SEQ_LENGTH: &'static str = "RETRO_MAX_SEQ_LENGTH";
    const ENV_TIMEOUT_MS: &'static str = "RETRO_TIMEOUT_MS";
    const ENV_COMBINER: &'static str = "RETRO_COMBINER";
    const ENV_BETA_EXT: &'static str = "RETRO_BETA_EXT";
    const ENV_BETA_INT: &'static str = "RETRO_BETA_INT";
    const ENV_LANGUAGE: &'static str = "RETRO_LANGUAGE";

    /// Stub configuration: no model files, default threshold.
    pub fn stub() -> Self {
        Self::default()
    }

    /// Sets the verification threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_combiner(mut self, combiner: CombinerConfig) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Reads a YAML configuration document.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a YAML configuration document held in memory.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Unlike a YAML document, the environment keeps the default threshold
    /// when `RETRO_THRESHOLD` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Overrides fields with any `RETRO_*` variables that are set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = Self::read_env(Self::ENV_MODEL_NAME) {
            self.model_name = name;
        }
        if let Some(path) = Self::read_env(Self::ENV_SKETCH_MODEL_PATH) {
            self.sketch_model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = Self::read_env(Self::ENV_INTENSIVE_MODEL_PATH) {
            self.intensive_model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = Self::read_env(Self::ENV_TOKENIZER_PATH) {
            self.tokenizer_path = Some(PathBuf::from(path));
        }
        if let Some(threshold) = Self::parse_env::<f32>(Self::ENV_THRESHOLD)? {
            self.threshold = Some(threshold);
        }
        if let Some(n) = Self::parse_env(Self::ENV_N_BEST_SIZE)? {
            self.n_best_size = n;
        }
        if let Some(k) = Self::parse_env(Self::ENV_TOP_K)? {
            self.top_k = k;
        }
        if let Some(len) = Self::parse_env(Self::ENV_MAX_ANSWER_LENGTH)? {
            self.max_answer_length = len;
        }
        if let Some(len) = Self::parse_env(Self::ENV_MAX_SEQ_LENGTH)? {
            self.max_seq_length = len;
        }
        if let Some(ms) = Self::parse_env(Self::ENV_TIMEOUT_MS)? {
            self.timeout_ms = ms;
        }
        if let Some(language) = Self::parse_env(Self::ENV_LANGUAGE)? {
            self.language = language;
        }
        self.combiner = self.combiner_from_env()?;
        Ok(())
    }

    fn combiner_from_env(&self) -> Result<CombinerConfig, ConfigError> {
        let kind = Self::read_env(Self::ENV_COMBINER);
        let beta_ext = Self::parse_env::<f32>(Self::ENV_BETA_EXT)?;
        let beta_int = Self::parse_env::<f32>(Self::ENV_BETA_INT)?;

        let (current_ext, current_int) = match self.combiner {
            CombinerConfig::Weighted { beta_ext, beta_int } => (beta_ext, beta_int),
            CombinerConfig::Direct => (DEFAULT_BETA_EXT, DEFAULT_BETA_INT),
        };

        match kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None if beta_ext.is_none() && beta_int.is_none() => Ok(self.combiner),
            Some("direct") => Ok(CombinerConfig::Direct),
            None | Some("weighted") => Ok(CombinerConfig::Weighted {
                beta_ext: beta_ext.unwrap_or(current_ext),
                beta_int: beta_int.unwrap_or(current_int),
            }),
            Some(other) => Err(ConfigError::InvalidEnvVar {
                name: Self::ENV_COMBINER,
                value: other.to_string(),
                reason: "expected 'direct' or 'weighted'".to_string(),
            }),
        }
    }

    /// Validates invariants and paths (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.threshold.ok_or(ConfigError::MissingThreshold)?;
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }

        if self.model_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "model_name",
                reason: "cannot be empty".to_string(),
            });
        }

        Self::require_positive("n_best_size", self.n_best_size)?;
        Self::require_positive("top_k", self.top_k)?;
        Self::require_positive("max_answer_length", self.max_answer_length)?;

        if self.max_seq_length < MIN_SEQ_LEN {
            return Err(ConfigError::InvalidValue {
                field: "max_seq_length",
                reason: format!("must be at least {MIN_SEQ_LEN}, got {}", self.max_seq_length),
            });
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be positive".to_string(),
            });
        }

        self.combiner.validate()?;

        for path in [&self.sketch_model_path, &self.intensive_model_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.tokenizer_path
            && !path.exists()
        {
            return Err(ConfigError::PathNotFound { path: path.clone() });
        }

        Ok(())
    }

    /// Returns `τ`, validating it.
    pub fn verified_threshold(&self) -> Result<f32, ConfigError> {
        match self.threshold {
            None => Err(ConfigError::MissingThreshold),
            Some(value) if !value.is_finite() => Err(ConfigError::InvalidThreshold { value }),
            Some(value) => Ok(value),
        }
    }

    /// Returns `true` if neither reader has model weights configured.
    pub fn is_stub(&self) -> bool {
        self.sketch_model_path.is_none() && self.intensive_model_path.is_none()
    }

    /// Where to load the shared tokenizer from, if any model is configured.
    pub fn resolved_tokenizer_path(&self) -> Option<PathBuf> {
        self.tokenizer_path
            .clone()
            .or_else(|| self.sketch_model_path.clone())
            .or_else(|| self.intensive_model_path.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn require_positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidValue {
                field,
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn read_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_env<T>(var_name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::read_env(var_name) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidEnvVar {
                    name: var_name,
                    reason: e.to_string(),
                    value,
                }),
            None => Ok(None),
        }
    }
}
