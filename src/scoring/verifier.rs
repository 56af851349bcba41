use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigError, ReaderConfig};
use crate::reader::{IntensiveOutput, SketchScore};

use super::combiner::ScoreCombiner;
use super::error::ScoringError;
use super::types::{VerificationResult, Vote};

/// Pure rear-verification decision.
///
/// `is_answerable = combiner(score_ext, null_margin) > threshold`, unless both
/// readers vote unanswerable, which settles the pair regardless of `threshold`.
/// A NaN combination never clears the threshold.
pub fn rear_verify(
    score_ext: f32,
    null_margin: f32,
    threshold: f32,
    combiner: &dyn ScoreCombiner,
) -> VerificationResult {
    let score_diff = combiner.combine(score_ext, null_margin);
    let sketch_vote = Vote::from_sketch(score_ext);
    let intensive_vote = Vote::from_null_margin(null_margin);
    let vetoed = sketch_vote == Vote::Unanswerable && intensive_vote == Vote::Unanswerable;

    VerificationResult {
        score_diff,
        is_answerable: !vetoed && score_diff > threshold,
        threshold,
        sketch_vote,
        intensive_vote,
    }
}

/// Threshold-gated comparator over the two submodule outputs.
///
/// Holds no per-call state; `τ` and the combination strategy are fixed at construction.
#[derive(Clone)]
pub struct RearVerifier {
    threshold: f32,
    combiner: Arc<dyn ScoreCombiner>,
}

impl std::fmt::Debug for RearVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RearVerifier")
            .field("threshold", &self.threshold)
            .field("combiner", &self.combiner.name())
            .finish()
    }
}

impl RearVerifier {
    pub fn new(threshold: f32, combiner: Arc<dyn ScoreCombiner>) -> Result<Self, ScoringError> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold { value: threshold }.into());
        }
        Ok(Self {
            threshold,
            combiner,
        })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self, ScoringError> {
        config.combiner.validate()?;
        Self::new(config.verified_threshold()?, config.combiner.build())
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn combiner_name(&self) -> &'static str {
        self.combiner.name()
    }

    pub fn verify(&self, sketch: &SketchScore, intensive: &IntensiveOutput) -> VerificationResult {
        let null_margin = intensive.null_margin();
        let result = rear_verify(
            sketch.score_ext,
            null_margin,
            self.threshold,
            self.combiner.as_ref(),
        );

        debug!(
            score_ext = sketch.score_ext,
            null_margin,
            score_diff = result.score_diff,
            threshold = self.threshold,
            combiner = self.combiner.name(),
            agreement = ?result.agreement(),
            status = result.debug_status(),
            "Rear verification"
        );

        result
    }
}
