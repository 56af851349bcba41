use std::path::Path;
use std::sync::Arc;

use candle_core::{Device, IndexOp};
use candle_nn::{Linear, Module};
use candle_transformers::models::bert::BertModel;
use tracing::debug;

use crate::encoding::EncodedInput;

use super::backbone::{Checkpoint, InputTensors};
use super::error::ModelError;

/// Raw per-token outputs of the span extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanLogits {
    pub start: Vec<f32>,
    pub end: Vec<f32>,
    /// `[no_answer, has_answer]` from the answer-verification pool, when the checkpoint has one.
    pub has_answer: Option<[f32; 2]>,
}

struct SpanExtractorImpl {
    backbone: BertModel,
    qa_outputs: Linear,
    has_ans: Option<Linear>,
}

/// Start/end span scorer with an optional `[CLS]` answerability pool.
#[derive(Clone)]
pub struct SpanExtractor {
    inner: Arc<SpanExtractorImpl>,
    device: Device,
}

impl std::fmt::Debug for SpanExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanExtractor")
            .field("device", &format!("{:?}", self.device))
            .field("has_answer_pool", &self.inner.has_ans.is_some())
            .finish()
    }
}

impl SpanExtractor {
    pub fn load(model_dir: &Path, device: &Device) -> Result<Self, ModelError> {
        let checkpoint = Checkpoint::open(model_dir, device)?;
        let hidden_size = checkpoint.hidden_size();
        let backbone = checkpoint.load_backbone()?;
        let vb = &checkpoint.vb;

        let qa_outputs = candle_nn::linear(hidden_size, 2, vb.pp("qa_outputs"))?;
        let has_ans = if vb.contains_tensor("has_ans.1.weight") {
            Some(candle_nn::linear(hidden_size, 2, vb.pp("has_ans.1"))?)
        } else {
            None
        };

        debug!(
            has_answer_pool = has_ans.is_some(),
            "Span extractor heads loaded"
        );

        Ok(Self {
            inner: Arc::new(SpanExtractorImpl {
                backbone,
                qa_outputs,
                has_ans,
            }),
            device: device.clone(),
        })
    }

    pub fn forward(&self, encoded: &EncodedInput) -> Result<SpanLogits, ModelError> {
        let inputs = InputTensors::new(encoded, &self.device)?;
        let hidden = self.inner.backbone.forward(
            &inputs.input_ids,
            &inputs.type_ids,
            Some(&inputs.attention_mask),
        )?;

        // [1, seq, 2]
        let logits = self.inner.qa_outputs.forward(&hidden)?;
        let start = logits.i((0, .., 0))?.to_vec1::<f32>()?;
        let end = logits.i((0, .., 1))?.to_vec1::<f32>()?;

        let has_answer = match &self.inner.has_ans {
            Some(head) => {
                let cls = hidden.i((.., 0, ..))?;
                let values = head.forward(&cls)?.flatten_all()?.to_vec1::<f32>()?;
                match values.as_slice() {
                    [no_answer, has_answer] => Some([*no_answer, *has_answer]),
                    _ => {
                        return Err(ModelError::InferenceFailed {
                            reason: format!("expected 2 answerability logits, got {}", values.len()),
                        });
                    }
                }
            }
            None => None,
        };

        if start.len() != encoded.len() || end.len() != encoded.len() {
            return Err(ModelError::InferenceFailed {
                reason: format!(
                    "span logits length {} does not match sequence length {}",
                    start.len(),
                    encoded.len()
                ),
            });
        }

        Ok(SpanLogits {
            start,
            end,
            has_answer,
        })
    }
}
