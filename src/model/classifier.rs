use std::path::Path;
use std::sync::Arc;

use candle_core::{Device, IndexOp};
use candle_nn::{Linear, Module};
use candle_transformers::models::bert::BertModel;

use crate::encoding::EncodedInput;

use super::backbone::{Checkpoint, InputTensors};
use super::error::ModelError;

/// Index of the "has answer" label when `id2label` does not say otherwise.
const DEFAULT_HAS_ANSWER_LABEL: usize = 1;

enum ClassifierHead {
    /// `classifier.dense` -> GELU -> `classifier.out_proj` (ELECTRA style).
    Projected { dense: Linear, out_proj: Linear },
    /// Single `classifier` linear (BERT style).
    Linear(Linear),
}

impl ClassifierHead {
    fn forward(&self, cls: &candle_core::Tensor) -> candle_core::Result<candle_core::Tensor> {
        match self {
            ClassifierHead::Projected { dense, out_proj } => {
                let hidden = dense.forward(cls)?.gelu_erf()?;
                out_proj.forward(&hidden)
            }
            ClassifierHead::Linear(linear) => linear.forward(cls),
        }
    }
}

struct AnswerabilityClassifierImpl {
    backbone: BertModel,
    head: ClassifierHead,
    has_answer_label: usize,
}

/// Two-label sequence classifier reading the `[CLS]` position.
///
/// Emits `logit[has_answer] - logit[no_answer]`.
#[derive(Clone)]
pub struct AnswerabilityClassifier {
    inner: Arc<AnswerabilityClassifierImpl>,
    device: Device,
}

impl std::fmt::Debug for AnswerabilityClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerabilityClassifier")
            .field("device", &format!("{:?}", self.device))
            .field("has_answer_label", &self.inner.has_answer_label)
            .finish()
    }
}

impl AnswerabilityClassifier {
    pub fn load(model_dir: &Path, device: &Device) -> Result<Self, ModelError> {
        let checkpoint = Checkpoint::open(model_dir, device)?;
        let hidden_size = checkpoint.hidden_size();

        let num_labels = checkpoint
            .meta
            .id2label
            .as_ref()
            .map_or(2, |labels| labels.len());
        if num_labels != 2 {
            return Err(ModelError::Unsupported {
                reason: format!("expected a 2-label classifier, found {num_labels} labels"),
            });
        }
        let has_answer_label = has_answer_label(checkpoint.meta.id2label.as_ref());

        let backbone = checkpoint.load_backbone()?;
        let vb = &checkpoint.vb;
        let head = if vb.contains_tensor("classifier.out_proj.weight") {
            ClassifierHead::Projected {
                dense: candle_nn::linear(hidden_size, hidden_size, vb.pp("classifier.dense"))?,
                out_proj: candle_nn::linear(hidden_size, 2, vb.pp("classifier.out_proj"))?,
            }
        } else {
            ClassifierHead::Linear(candle_nn::linear(hidden_size, 2, vb.pp("classifier"))?)
        };

        Ok(Self {
            inner: Arc::new(AnswerabilityClassifierImpl {
                backbone,
                head,
                has_answer_label,
            }),
            device: device.clone(),
        })
    }

    /// Returns the answerability margin for one encoded pair.
    pub fn forward(&self, encoded: &EncodedInput) -> Result<f32, ModelError> {
        let inputs = InputTensors::new(encoded, &self.device)?;
        let hidden = self.inner.backbone.forward(
            &inputs.input_ids,
            &inputs.type_ids,
            Some(&inputs.attention_mask),
        )?;
        let cls = hidden.i((.., 0, ..))?;
        let logits = self
            .inner
            .head
            .forward(&cls)?
            .flatten_all()?
            .to_vec1::<f32>()?;

        let has = self.inner.has_answer_label;
        match (logits.get(has), logits.get(1 - has)) {
            (Some(has_answer), Some(no_answer)) => Ok(has_answer - no_answer),
            _ => Err(ModelError::InferenceFailed {
                reason: format!("expected 2 logits, got {}", logits.len()),
            }),
        }
    }
}

/// Picks the "has answer" label from `id2label` names, if they are descriptive.
pub(crate) fn has_answer_label(
    id2label: Option<&std::collections::BTreeMap<String, String>>,
) -> usize {
    const NEGATIVE_MARKERS: [&str; 4] = ["impossible", "unanswerable", "no_answer", "no answer"];

    let Some(labels) = id2label else {
        return DEFAULT_HAS_ANSWER_LABEL;
    };

    let negative = labels.iter().find_map(|(id, name)| {
        let name = name.to_lowercase();
        NEGATIVE_MARKERS
            .iter()
            .any(|marker| name.contains(marker))
            .then(|| id.parse::<usize>().ok())
            .flatten()
    });

    match negative {
        Some(0) => 1,
        Some(1) => 0,
        _ => DEFAULT_HAS_ANSWER_LABEL,
    }
}
