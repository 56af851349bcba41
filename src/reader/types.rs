use std::fmt;

/// Which of the two submodules a reader is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderKind {
    /// Whole-passage answerability classifier.
    Sketch,
    /// Span extractor with its own null score.
    Intensive,
}

impl ReaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderKind::Sketch => "sketch",
            ReaderKind::Intensive => "intensive",
        }
    }
}

impl fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sketch reader output: the external front verification score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchScore {
    /// Higher means more likely answerable.
    pub score_ext: f32,
}

/// One candidate span in token coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSpan {
    /// First token (inclusive).
    pub start: usize,
    /// Last token (inclusive).
    pub end: usize,
    /// `start_logit[start] + end_logit[end]`.
    pub raw_score: f32,
}

impl RawSpan {
    pub fn new(start: usize, end: usize, raw_score: f32) -> Self {
        Self {
            start,
            end,
            raw_score,
        }
    }

    /// Span length in tokens; zero for a backwards span.
    pub fn token_len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }
}

/// Intensive reader output: the pruned span surface plus the null score.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensiveOutput {
    /// Score of the reserved no-answer position, on the same scale as span scores.
    pub null_score: f32,
    /// Pruned candidates in pruning order (starts by logit, then ends by logit).
    pub spans: Vec<RawSpan>,
    /// `[no_answer, has_answer]` from the answerability pool, when present.
    pub has_answer_logits: Option<[f32; 2]>,
}

impl IntensiveOutput {
    /// Best raw span score, or `-inf` if no span survived pruning.
    pub fn best_span_score(&self) -> f32 {
        self.spans
            .iter()
            .map(|span| span.raw_score)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// `null_score - best_span_score`: the intensive reader's "no answer" vote.
    ///
    /// Positive means the null position beats every span.
    pub fn null_margin(&self) -> f32 {
        self.null_score - self.best_span_score()
    }
}

/// Output of either reader variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderOutput {
    Sketch(SketchScore),
    Intensive(IntensiveOutput),
}

impl ReaderOutput {
    pub fn kind(&self) -> ReaderKind {
        match self {
            ReaderOutput::Sketch(_) => ReaderKind::Sketch,
            ReaderOutput::Intensive(_) => ReaderKind::Intensive,
        }
    }
}
