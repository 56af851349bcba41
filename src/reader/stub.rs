//! Lexical stand-ins for the neural readers.
//!
//! Deterministic and weight-free, so the full pipeline can run in tests and
//! demos. Scores are logit-like but carry no learned signal.

use std::collections::HashSet;

use crate::encoding::EncodedInput;
use crate::encoding::basic::word_spans;

/// Logit given to query, separator and padding positions.
pub(crate) const OUTSIDE_LOGIT: f32 = -10.0;
pub(crate) const STOP_WORD_LOGIT: f32 = -2.0;
pub(crate) const OVERLAP_LOGIT: f32 = -1.0;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "dare", "ought", "used", "to", "of", "in", "for", "on", "with", "at", "by",
    "from", "as", "into", "through", "during", "before", "after", "above", "below", "between",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
    "all", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "just", "and", "but", "if", "or", "because",
    "until", "while", "what", "which", "who", "whom", "this", "that", "these", "those", "am",
    "it", "its", "i", "you", "he", "she",
];

/// Lowercased alphanumeric form of a token, or `None` for punctuation.
pub(crate) fn normalize(token: &str) -> Option<String> {
    let word: String = token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    (!word.is_empty()).then_some(word)
}

pub(crate) fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Normalized non-stop words of `text`.
pub(crate) fn content_words(text: &str) -> HashSet<String> {
    word_spans(text)
        .into_iter()
        .filter_map(|(start, end)| normalize(&text[start..end]))
        .filter(|word| !is_stop_word(word))
        .collect()
}

/// Fraction of the query's content words found among the encoded context tokens.
pub(crate) fn query_recall(encoded: &EncodedInput) -> f32 {
    let query_words = content_words(encoded.query());
    if query_words.is_empty() {
        return 0.0;
    }

    let context_words: HashSet<String> = (0..encoded.len())
        .filter_map(|idx| encoded.token_text(idx))
        .filter_map(normalize)
        .collect();

    let matches = query_words.intersection(&context_words).count();
    matches as f32 / query_words.len() as f32
}

/// `8 * (recall - 0.5)`: +4 for full overlap, -4 for none.
pub(crate) fn sketch_score(encoded: &EncodedInput) -> f32 {
    8.0 * (query_recall(encoded) - 0.5)
}

/// Per-token start/end logits for the intensive stub.
///
/// Unseen context content words score `1 + recall`, words the query already
/// contains score -1, stop words and punctuation -2. The no-answer position
/// scores `2 * (1 - recall)`.
pub(crate) fn span_logits(encoded: &EncodedInput) -> Vec<f32> {
    let recall = query_recall(encoded);
    let query_words = content_words(encoded.query());

    (0..encoded.len())
        .map(|idx| {
            if idx == 0 {
                return 2.0 * (1.0 - recall);
            }
            let Some(text) = encoded.token_text(idx) else {
                return OUTSIDE_LOGIT;
            };
            match normalize(text) {
                None => STOP_WORD_LOGIT,
                Some(word) if is_stop_word(&word) => STOP_WORD_LOGIT,
                Some(word) if query_words.contains(&word) => OVERLAP_LOGIT,
                Some(_) => 1.0 + recall,
            }
        })
        .collect()
}
