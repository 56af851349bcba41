use serde::Serialize;

/// One submodule's answerability vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Answerable,
    Unanswerable,
}

impl Vote {
    /// Sketch vote: a positive `score_ext` means answerable.
    pub fn from_sketch(score_ext: f32) -> Self {
        if score_ext > 0.0 {
            Vote::Answerable
        } else {
            Vote::Unanswerable
        }
    }

    /// Intensive vote: a negative null margin means some span beats the null position.
    pub fn from_null_margin(null_margin: f32) -> Self {
        if null_margin < 0.0 {
            Vote::Answerable
        } else {
            Vote::Unanswerable
        }
    }
}

/// Whether the two submodules agree on answerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    BothAnswerable,
    BothUnanswerable,
    Disagree,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Outcome of rear verification. The only artifact that gates span output.
pub struct VerificationResult {
    /// Combined answerability score compared against the threshold.
    pub score_diff: f32,
    /// `score_diff > threshold`.
    pub is_answerable: bool,
    /// Threshold the decision was made against.
    pub threshold: f32,
    pub sketch_vote: Vote,
    pub intensive_vote: Vote,
}

impl VerificationResult {
    /// How the submodules voted, independently of the combined decision.
    pub fn agreement(&self) -> Agreement {
        match (self.sketch_vote, self.intensive_vote) {
            (Vote::Answerable, Vote::Answerable) => Agreement::BothAnswerable,
            (Vote::Unanswerable, Vote::Unanswerable) => Agreement::BothUnanswerable,
            _ => Agreement::Disagree,
        }
    }

    /// Margin by which the decision cleared (or missed) the threshold.
    pub fn margin(&self) -> f32 {
        self.score_diff - self.threshold
    }

    /// Returns a short debug string.
    pub fn debug_status(&self) -> &'static str {
        if self.is_answerable {
            "ANSWERABLE"
        } else {
            "UNANSWERABLE"
        }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (score_diff: {:.4}, threshold: {:.4})",
            self.debug_status(),
            self.score_diff,
            self.threshold
        )
    }
}
