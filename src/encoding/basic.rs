use tracing::debug;

use super::error::EncodingError;
use super::{EncodedInput, QaEncoder};

pub const BASIC_VOCAB_SIZE: u32 = 30_522;
pub const CLS_ID: u32 = 101;
pub const SEP_ID: u32 = 102;

/// Deterministic word-level encoder.
///
/// Splits on whitespace, keeps alphanumeric runs as single tokens and every
/// other character as its own token. Ids are a stable hash of the lowercased
/// token, so the same text always encodes the same way.
#[derive(Debug, Clone)]
pub struct BasicEncoder {
    max_seq_len: usize,
}

impl BasicEncoder {
    pub fn new(max_seq_len: usize) -> Self {
        Self { max_seq_len }
    }
}

impl QaEncoder for BasicEncoder {
    fn encode(&self, query: &str, context: &str) -> Result<EncodedInput, EncodingError> {
        if query.trim().is_empty() {
            return Err(EncodingError::EmptyQuery);
        }
        if context.trim().is_empty() {
            return Err(EncodingError::EmptyContext);
        }

        let query_tokens = word_spans(query);
        let mut context_tokens = word_spans(context);

        // [CLS] query [SEP] ... [SEP] and at least one context token
        let budget = self.max_seq_len.saturating_sub(3);
        if query_tokens.len() >= budget {
            return Err(EncodingError::QueryTooLong {
                tokens: query_tokens.len(),
                max: budget.saturating_sub(1),
            });
        }

        let context_budget = budget - query_tokens.len();
        let truncated = context_tokens.len() > context_budget;
        context_tokens.truncate(context_budget);

        let len = query_tokens.len() + context_tokens.len() + 3;
        let mut input_ids = Vec::with_capacity(len);
        let mut type_ids = Vec::with_capacity(len);
        let mut context_offsets = Vec::with_capacity(len);

        input_ids.push(CLS_ID);
        type_ids.push(0);
        context_offsets.push(None);

        for &(start, end) in &query_tokens {
            input_ids.push(token_id(&query[start..end]));
            type_ids.push(0);
            context_offsets.push(None);
        }

        input_ids.push(SEP_ID);
        type_ids.push(0);
        context_offsets.push(None);

        for &(start, end) in &context_tokens {
            input_ids.push(token_id(&context[start..end]));
            type_ids.push(1);
            context_offsets.push(Some((start, end)));
        }

        input_ids.push(SEP_ID);
        type_ids.push(1);
        context_offsets.push(None);

        debug!(
            seq_len = input_ids.len(),
            query_tokens = query_tokens.len(),
            context_tokens = context_tokens.len(),
            truncated,
            "Encoded query/context pair"
        );

        let attention_mask = vec![1; input_ids.len()];
        EncodedInput::new(
            input_ids,
            type_ids,
            attention_mask,
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
        "basic"
    }
}

/// Byte ranges of the word-level tokens of `text`.
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            word_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = word_start.take() {
            spans.push((start, idx));
        }
        if !ch.is_whitespace() {
            spans.push((idx, idx + ch.len_utf8()));
        }
    }
    if let Some(start) = word_start {
        spans.push((start, text.len()));
    }

    spans
}

fn token_id(token: &str) -> u32 {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in token.to_lowercase().bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    // keep clear of the special ids at the bottom of the vocabulary
    1_000 + hash % (BASIC_VOCAB_SIZE - 1_000)
}
