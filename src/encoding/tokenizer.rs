use std::path::Path;

use tokenizers::{PostProcessor, Tokenizer, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use crate::model::utils::load_tokenizer;

use super::error::EncodingError;
use super::{EncodedInput, QaEncoder};

/// Hugging Face tokenizer adapter.
///
/// Pairs are truncated on the context side only; a query that cannot fit
/// alongside at least one context token is rejected.
pub struct TokenizerEncoder {
    tokenizer: Tokenizer,
    // Same vocabulary without truncation, used to measure the query alone.
    plain: Tokenizer,
    max_seq_len: usize,
    pair_specials: usize,
}

impl std::fmt::Debug for TokenizerEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerEncoder")
            .field("max_seq_len", &self.max_seq_len)
            .field("pair_specials", &self.pair_specials)
            .field("vocab_size", &self.plain.get_vocab_size(true))
            .finish()
    }
}

impl TokenizerEncoder {
    /// Loads `tokenizer.json` from a file or model directory.
    pub fn load(path: &Path, max_seq_len: usize) -> Result<Self, EncodingError> {
        let tokenizer = load_tokenizer(path).map_err(|e| EncodingError::TokenizerLoadFailed {
            reason: format!("{}: {}", path.display(), e),
        })?;

        info!(
            tokenizer_path = %path.display(),
            max_seq_len,
            "Tokenizer loaded"
        );

        Self::from_tokenizer(tokenizer, max_seq_len)
    }

    /// Wraps an already-built tokenizer.
    pub fn from_tokenizer(tokenizer: Tokenizer, max_seq_len: usize) -> Result<Self, EncodingError> {
        let mut plain = tokenizer.clone();
        plain
            .with_truncation(None)
            .map_err(|e| EncodingError::TokenizerLoadFailed {
                reason: format!("failed to disable truncation: {e}"),
            })?;
        plain.with_padding(None);

        let mut truncating = plain.clone();
        truncating
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_len,
                strategy: TruncationStrategy::OnlySecond,
                ..Default::default()
            }))
            .map_err(|e| EncodingError::TokenizerLoadFailed {
                reason: format!("failed to configure truncation: {e}"),
            })?;

        // Position 0 must be a leading special token; it carries the null score.
        let pair_specials = match plain.get_post_processor() {
            Some(processor) if processor.added_tokens(true) > 0 => processor.added_tokens(true),
            _ => {
                return Err(EncodingError::TokenizerLoadFailed {
                    reason: "tokenizer adds no special tokens around a pair".to_string(),
                });
            }
        };

        Ok(Self {
            tokenizer: truncating,
            plain,
            max_seq_len,
            pair_specials,
        })
    }
}

impl QaEncoder for TokenizerEncoder {
    fn encode(&self, query: &str, context: &str) -> Result<EncodedInput, EncodingError> {
        if query.trim().is_empty() {
            return Err(EncodingError::EmptyQuery);
        }
        if context.trim().is_empty() {
            return Err(EncodingError::EmptyContext);
        }

        let query_len = self
            .plain
            .encode(query, false)
            .map_err(|e| EncodingError::TokenizationFailed {
                reason: e.to_string(),
            })?
            .get_ids()
            .len();
        let max_query = self
            .max_seq_len
            .saturating_sub(self.pair_specials)
            .saturating_sub(1);
        if query_len > max_query {
            return Err(EncodingError::QueryTooLong {
                tokens: query_len,
                max: max_query,
            });
        }

        let encoding = self.tokenizer.encode((query, context), true).map_err(|e| {
            EncodingError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let context_offsets: Vec<Option<(usize, usize)>> = encoding
            .get_sequence_ids()
            .into_iter()
            .zip(encoding.get_offsets())
            .map(|(seq, &offset)| (seq == Some(1)).then_some(offset))
            .collect();

        let truncated = !encoding.get_overflowing().is_empty();

        debug!(
            seq_len = encoding.get_ids().len(),
            query_tokens = query_len,
            truncated,
            "Encoded query/context pair"
        );

        EncodedInput::new(
            encoding.get_ids().to_vec(),
            encoding.get_type_ids().to_vec(),
            encoding.get_attention_mask().to_vec(),
            context_offsets,
            query,
            context,
            truncated,
        )
    }

    fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    fn name(&self) -> &'static str {
        "tokenizer"
    }
}
