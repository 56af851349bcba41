use std::sync::Arc;

use crate::config::CombinerConfig;

/// Folds the sketch score and the intensive null margin into one `score_diff`.
///
/// Implementations must be monotonic: non-decreasing in `score_ext` and
/// non-increasing in `null_margin`.
pub trait ScoreCombiner: Send + Sync {
    fn combine(&self, score_ext: f32, null_margin: f32) -> f32;

    fn name(&self) -> &'static str {
        "custom"
    }
}

/// `score_ext - null_margin`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectDifference;

impl ScoreCombiner for DirectDifference {
    fn combine(&self, score_ext: f32, null_margin: f32) -> f32 {
        score_ext - null_margin
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// `beta_ext * score_ext - beta_int * null_margin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedDifference {
    pub beta_ext: f32,
    pub beta_int: f32,
}

impl WeightedDifference {
    pub fn new(beta_ext: f32, beta_int: f32) -> Self {
        Self { beta_ext, beta_int }
    }
}

impl ScoreCombiner for WeightedDifference {
    fn combine(&self, score_ext: f32, null_margin: f32) -> f32 {
        // A zero weight drops its term entirely, so an infinite margin cannot produce NaN.
        let ext = if self.beta_ext == 0.0 {
            0.0
        } else {
            self.beta_ext * score_ext
        };
        let int = if self.beta_int == 0.0 {
            0.0
        } else {
            self.beta_int * null_margin
        };
        ext - int
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

impl<F> ScoreCombiner for F
where
    F: Fn(f32, f32) -> f32 + Send + Sync,
{
    fn combine(&self, score_ext: f32, null_margin: f32) -> f32 {
        self(score_ext, null_margin)
    }
}

impl CombinerConfig {
    /// Builds the configured strategy.
    pub fn build(&self) -> Arc<dyn ScoreCombiner> {
        match *self {
            CombinerConfig::Direct => Arc::new(DirectDifference),
            CombinerConfig::Weighted { beta_ext, beta_int } => {
                Arc::new(WeightedDifference::new(beta_ext, beta_int))
            }
        }
    }
}
