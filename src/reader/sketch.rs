use std::path::Path;

use candle_core::Device;
use tracing::{debug, info, warn};

use crate::encoding::EncodedInput;
use crate::model::AnswerabilityClassifier;

use super::Reader;
use super::error::ReaderError;
use super::stub;
use super::types::{ReaderKind, ReaderOutput, SketchScore};

enum SketchBackend {
    Model(AnswerabilityClassifier),
    Stub,
}

/// Coarse answerability classifier over the whole encoded pair.
pub struct SketchReader {
    backend: SketchBackend,
}

impl std::fmt::Debug for SketchReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SketchReader")
            .field(
                "backend",
                &match &self.backend {
                    SketchBackend::Model(model) => format!("Model({model:?})"),
                    SketchBackend::Stub => "Stub".to_string(),
                },
            )
            .finish()
    }
}

impl SketchReader {
    /// Loads the classifier checkpoint, or a stub when `model_path` is `None`.
    pub fn load(model_path: Option<&Path>, device: &Device) -> Result<Self, ReaderError> {
        match model_path {
            Some(path) => {
                info!(model_path = %path.display(), "Loading sketch reader");
                let model = AnswerabilityClassifier::load(path, device)?;
                info!("Sketch reader loaded");
                Ok(Self {
                    backend: SketchBackend::Model(model),
                })
            }
            None => {
                warn!("No sketch model path configured, sketch reader running in stub mode");
                Ok(Self::stub())
            }
        }
    }

    pub fn stub() -> Self {
        Self {
            backend: SketchBackend::Stub,
        }
    }

    /// Scores one encoded pair; higher means more likely answerable.
    pub fn score(&self, encoded: &EncodedInput) -> Result<SketchScore, ReaderError> {
        let score_ext = match &self.backend {
            SketchBackend::Model(model) => model.forward(encoded)?,
            SketchBackend::Stub => stub::sketch_score(encoded),
        };

        if score_ext.is_nan() {
            return Err(ReaderError::InvalidOutput {
                kind: ReaderKind::Sketch,
                reason: "score_ext is NaN".to_string(),
            });
        }

        debug!(
            score_ext,
            model_loaded = self.is_model_loaded(),
            "Sketch reader scored pair"
        );

        Ok(SketchScore { score_ext })
    }
}

impl Reader for SketchReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Sketch
    }

    fn read(&self, encoded: &EncodedInput) -> Result<ReaderOutput, ReaderError> {
        self.score(encoded).map(ReaderOutput::Sketch)
    }

    fn is_model_loaded(&self) -> bool {
        matches!(self.backend, SketchBackend::Model(_))
    }
}
