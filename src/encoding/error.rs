use thiserror::Error;

/// Input violates the encoder's length/format contract.
///
/// Surfaced to the caller as-is and never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodingError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("context is empty")]
    EmptyContext,

    #[error("query needs {tokens} tokens but at most {max} fit alongside the context")]
    QueryTooLong { tokens: usize, max: usize },

    #[error("no context tokens survived encoding")]
    NoContextTokens,

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("failed to load tokenizer: {reason}")]
    TokenizerLoadFailed { reason: String },

    #[error("malformed encoded input: {reason}")]
    Malformed { reason: String },
}
