//! N-best aggregation of the intensive reader's span surface.
//!
//! Runs only after rear verification accepted the pair. Spans are ranked by
//! raw score, decoded back to context text, deduplicated by text, cut to
//! `top_k` and softmax-normalized over the retained set.


use serde::Serialize;
use tracing::debug;

use crate::encoding::EncodedInput;
use crate::reader::RawSpan;

/// One ranked answer candidate.
///
/// Offsets are byte offsets into the original context, with `end_offset`
/// exclusive, so `&context[start_offset..end_offset] == text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanCandidate {
    pub text: String,
    pub probability: f32,
    pub raw_score: f32,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(skip)]
    pub start_token: usize,
    #[serde(skip)]
    pub end_token: usize,
}

/// Ranked, text-distinct candidates, sorted by descending probability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NBestList {
    candidates: Vec<SpanCandidate>,
}

impl NBestList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn top(&self) -> Option<&SpanCandidate> {
        self.candidates.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpanCandidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[SpanCandidate] {
        &self.candidates
    }

    /// Keeps only the first `k` entries. Probabilities are not renormalized.
    pub fn truncate(&mut self, k: usize) {
        self.candidates.truncate(k);
    }
}

impl<'a> IntoIterator for &'a NBestList {
    type Item = &'a SpanCandidate;
    type IntoIter = std::slice::Iter<'a, SpanCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Builds the n-best list from raw spans.
pub fn aggregate(spans: &[RawSpan], encoded: &EncodedInput, top_k: usize) -> NBestList {
    let mut ranked: Vec<&RawSpan> = spans.iter().filter(|s| !s.raw_score.is_nan()).collect();
    // stable: equal scores keep pruning order
    ranked.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));

    let mut kept: Vec<(RawSpan, usize, usize, &str)> = Vec::with_capacity(top_k);
    let mut dropped_empty = 0usize;
    let mut dropped_duplicate = 0usize;

    for span in ranked {
        if kept.len() == top_k {
            break;
        }
        let decoded = encoded
            .span_offsets(span.start, span.end)
            .and_then(|(start, end)| Some((start, end, encoded.context().get(start..end)?)));
        let Some((start_offset, end_offset, text)) = decoded else {
            dropped_empty += 1;
            continue;
        };
        if text.trim().is_empty() {
            dropped_empty += 1;
            continue;
        }
        if kept.iter().any(|(_, _, _, seen)| *seen == text) {
            dropped_duplicate += 1;
            continue;
        }
        kept.push((*span, start_offset, end_offset, text));
    }

    let scores: Vec<f32> = kept.iter().map(|(span, ..)| span.raw_score).collect();
    let probabilities = softmax(&scores);

    let candidates: Vec<SpanCandidate> = kept
        .into_iter()
        .zip(probabilities)
        .map(
            |((span, start_offset, end_offset, text), probability)| SpanCandidate {
                text: text.to_string(),
                probability,
                raw_score: span.raw_score,
                start_offset,
                end_offset,
                start_token: span.start,
                end_token: span.end,
            },
        )
        .collect();

    debug!(
        input_spans = spans.len(),
        kept = candidates.len(),
        dropped_empty,
        dropped_duplicate,
        top_k,
        "Aggregated n-best spans"
    );

    NBestList { candidates }
}

/// Numerically stable softmax. Empty input yields an empty output.
///
/// A `-inf` entry gets probability zero; if every entry is `-inf` the
/// distribution is uniform. `+inf` entries share all the mass.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return vec![1.0 / scores.len() as f32; scores.len()];
    }
    if max == f32::INFINITY {
        let winners = scores.iter().filter(|&&s| s == f32::INFINITY).count() as f32;
        return scores
            .iter()
            .map(|&s| if s == f32::INFINITY { 1.0 / winners } else { 0.0 })
            .collect();
    }

    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// `logits[positive] - logits[negative]`, the log-odds of a two-way head.
pub fn logit_margin(logits: [f32; 2], positive: usize) -> f32 {
    let negative = 1 - positive.min(1);
    logits[positive.min(1)] - logits[negative]
}
