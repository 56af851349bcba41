use std::path::Path;

use candle_core::Device;
use tracing::{debug, info, warn};

use crate::encoding::EncodedInput;
use crate::model::{SpanExtractor, SpanLogits};

use super::Reader;
use super::error::ReaderError;
use super::stub;
use super::types::{IntensiveOutput, RawSpan, ReaderKind, ReaderOutput};

enum IntensiveBackend {
    Model(SpanExtractor),
    Stub,
}

/// Span extractor that also reports a no-answer score.
pub struct IntensiveReader {
    backend: IntensiveBackend,
    n_best_size: usize,
    max_answer_length: usize,
}

impl std::fmt::Debug for IntensiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntensiveReader")
            .field(
                "backend",
                &match &self.backend {
                    IntensiveBackend::Model(model) => format!("Model({model:?})"),
                    IntensiveBackend::Stub => "Stub".to_string(),
                },
            )
            .field("n_best_size", &self.n_best_size)
            .field("max_answer_length", &self.max_answer_length)
            .finish()
    }
}

impl IntensiveReader {
    /// Loads the span extractor checkpoint, or a stub when `model_path` is `None`.
    pub fn load(
        model_path: Option<&Path>,
        device: &Device,
        n_best_size: usize,
        max_answer_length: usize,
    ) -> Result<Self, ReaderError> {
        let backend = match model_path {
            Some(path) => {
                info!(model_path = %path.display(), "Loading intensive reader");
                let model = SpanExtractor::load(path, device)?;
                info!(n_best_size, max_answer_length, "Intensive reader loaded");
                IntensiveBackend::Model(model)
            }
            None => {
                warn!("No intensive model path configured, intensive reader running in stub mode");
                IntensiveBackend::Stub
            }
        };

        Ok(Self {
            backend,
            n_best_size,
            max_answer_length,
        })
    }

    pub fn stub(n_best_size: usize, max_answer_length: usize) -> Self {
        Self {
            backend: IntensiveBackend::Stub,
            n_best_size,
            max_answer_length,
        }
    }

    /// Scores the span surface of one encoded pair.
    pub fn score(&self, encoded: &EncodedInput) -> Result<IntensiveOutput, ReaderError> {
        let logits = match &self.backend {
            IntensiveBackend::Model(model) => model.forward(encoded)?,
            IntensiveBackend::Stub => {
                let logits = stub::span_logits(encoded);
                SpanLogits {
                    start: logits.clone(),
                    end: logits,
                    has_answer: None,
                }
            }
        };

        if logits.start.len() != encoded.len() || logits.end.len() != encoded.len() {
            return Err(ReaderError::InvalidOutput {
                kind: ReaderKind::Intensive,
                reason: format!(
                    "expected {} start/end logits, got {}/{}",
                    encoded.len(),
                    logits.start.len(),
                    logits.end.len()
                ),
            });
        }

        let null_score = logits.start[0] + logits.end[0];
        if null_score.is_nan() {
            return Err(ReaderError::InvalidOutput {
                kind: ReaderKind::Intensive,
                reason: "null score is NaN".to_string(),
            });
        }

        let spans = prune_spans(
            &logits.start,
            &logits.end,
            encoded,
            self.n_best_size,
            self.max_answer_length,
        );

        let output = IntensiveOutput {
            null_score,
            spans,
            has_answer_logits: logits.has_answer,
        };

        debug!(
            null_score,
            best_span_score = output.best_span_score(),
            candidates = output.spans.len(),
            model_loaded = self.is_model_loaded(),
            "Intensive reader scored pair"
        );

        Ok(output)
    }
}

impl Reader for IntensiveReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Intensive
    }

    fn read(&self, encoded: &EncodedInput) -> Result<ReaderOutput, ReaderError> {
        self.score(encoded).map(ReaderOutput::Intensive)
    }

    fn is_model_loaded(&self) -> bool {
        matches!(self.backend, IntensiveBackend::Model(_))
    }
}

/// Best-first pruning of the span surface.
///
/// Keeps the top `n_best_size` start and end positions by their own logit,
/// forms every start/end pair, and drops pairs that leave the context, run
/// backwards, or exceed `max_answer_length` tokens. Output order is start rank,
/// then end rank.
pub fn prune_spans(
    start_logits: &[f32],
    end_logits: &[f32],
    encoded: &EncodedInput,
    n_best_size: usize,
    max_answer_length: usize,
) -> Vec<RawSpan> {
    let starts = top_indices(start_logits, n_best_size);
    let ends = top_indices(end_logits, n_best_size);

    let mut spans = Vec::with_capacity(starts.len() * ends.len());
    for &start in &starts {
        if !encoded.is_context_token(start) {
            continue;
        }
        for &end in &ends {
            if !encoded.is_context_token(end) || end < start {
                continue;
            }
            let span = RawSpan::new(start, end, start_logits[start] + end_logits[end]);
            if span.token_len() > max_answer_length || span.raw_score.is_nan() {
                continue;
            }
            spans.push(span);
        }
    }
    spans
}

/// Indices of the `n` largest values, ties broken by position.
fn top_indices(logits: &[f32], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..logits.len()).filter(|&i| !logits[i].is_nan()).collect();
    indices.sort_by(|&a, &b| logits[b].total_cmp(&logits[a]).then(a.cmp(&b)));
    indices.truncate(n);
    indices
}
