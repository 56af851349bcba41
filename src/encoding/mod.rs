//! Query/context encoding.
//!
//! [`QaEncoder`] is the adapter contract between raw text and the readers:
//! it turns a `(query, context)` pair into an [`EncodedInput`] laid out as
//! `[CLS] query [SEP] context [SEP]`, with byte offsets back into the
//! context for every context token.
//!
//! - [`TokenizerEncoder`] wraps a Hugging Face `tokenizer.json`.
//! - [`BasicEncoder`] is a deterministic word-level encoder used in stub mode.

pub mod basic;
pub mod error;
pub mod tokenizer;


pub use basic::BasicEncoder;
pub use error::EncodingError;
pub use tokenizer::TokenizerEncoder;

use std::sync::Arc;

/// Converts `(query, context)` pairs into model-ready sequences.
pub trait QaEncoder: Send + Sync {
    fn encode(&self, query: &str, context: &str) -> Result<EncodedInput, EncodingError>;

    /// Longest sequence this encoder produces.
    fn max_seq_len(&self) -> usize;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// One encoded `(query, context)` pair.
///
/// Owned by a single inference call. Position 0 is always the `[CLS]`
/// ("no answer") position.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInput {
    input_ids: Vec<u32>,
    type_ids: Vec<u32>,
    attention_mask: Vec<u32>,
    context_offsets: Vec<Option<(usize, usize)>>,
    query: Arc<str>,
    context: Arc<str>,
    truncated: bool,
}

impl EncodedInput {
    /// Builds an encoded input, checking that all per-token vectors line up and
    /// that every context offset is a valid byte range of `context`.
    pub fn new(
        input_ids: Vec<u32>,
        type_ids: Vec<u32>,
        attention_mask: Vec<u32>,
        context_offsets: Vec<Option<(usize, usize)>>,
        query: &str,
        context: &str,
        truncated: bool,
    ) -> Result<Self, EncodingError> {
        let len = input_ids.len();
        if len == 0 {
            return Err(EncodingError::Malformed {
                reason: "empty sequence".to_string(),
            });
        }
        if type_ids.len() != len || attention_mask.len() != len || context_offsets.len() != len
        {
            return Err(EncodingError::Malformed {
                reason: format!(
                    "length mismatch: ids={}, type_ids={}, mask={}, offsets={}",
                    len,
                    type_ids.len(),
                    attention_mask.len(),
                    context_offsets.len()
                ),
            });
        }
        if context_offsets[0].is_some() {
            return Err(EncodingError::Malformed {
                reason: "position 0 must be the no-answer position".to_string(),
            });
        }
        for (idx, offset) in context_offsets.iter().enumerate() {
            if let Some((start, end)) = *offset
                && (start > end || context.get(start..end).is_none())
            {
                return Err(EncodingError::Malformed {
                    reason: format!("token {idx} has invalid context range {start}..{end}"),
                });
            }
        }
        if context_offsets.iter().all(Option::is_none) {
            return Err(EncodingError::NoContextTokens);
        }

        Ok(Self {
            input_ids,
            type_ids,
            attention_mask,
            context_offsets,
            query: Arc::from(query),
            context: Arc::from(context),
            truncated,
        })
    }

    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    pub fn input_ids(&self) -> &[u32] {
        &self.input_ids
    }

    pub fn type_ids(&self) -> &[u32] {
        &self.type_ids
    }

    pub fn attention_mask(&self) -> &[u32] {
        &self.attention_mask
    }

    /// Byte range into the context per token; `None` for query and special tokens.
    pub fn context_offsets(&self) -> &[Option<(usize, usize)>] {
        &self.context_offsets
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// `true` if the context was cut to fit the sequence length.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_context_token(&self, index: usize) -> bool {
        matches!(self.context_offsets.get(index), Some(Some(_)))
    }

    pub fn context_token_count(&self) -> usize {
        self.context_offsets.iter().filter(|o| o.is_some()).count()
    }

    /// Text of a single context token.
    pub fn token_text(&self, index: usize) -> Option<&str> {
        let (start, end) = (*self.context_offsets.get(index)?)?;
        self.context.get(start..end)
    }

    /// Maps a token span to its byte range in the original context.
    ///
    /// Returns `None` if either end is not a context token or `end < start`.
    pub fn span_offsets(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if end < start {
            return None;
        }
        let (char_start, _) = (*self.context_offsets.get(start)?)?;
        let (_, char_end) = (*self.context_offsets.get(end)?)?;
        if char_end < char_start {
            return None;
        }
        Some((char_start, char_end))
    }

    /// Decodes a token span to the contiguous context substring it covers.
    pub fn span_text(&self, start: usize, end: usize) -> Option<&str> {
        let (char_start, char_end) = self.span_offsets(start, end)?;
        self.context.get(char_start..char_end)
    }
}
