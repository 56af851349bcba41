use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use tracing::debug;

use crate::encoding::EncodedInput;

use super::error::ModelError;
use super::utils::checkpoint_files;

/// Tensor prefixes tried, in order, when locating the transformer encoder.
const BACKBONE_PREFIXES: [&str; 3] = ["electra", "bert", "roberta"];

/// Fields of `config.json` that candle's BERT config does not carry.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CheckpointMeta {
    #[serde(default)]
    pub embedding_size: Option<usize>,
    #[serde(default)]
    pub id2label: Option<std::collections::BTreeMap<String, String>>,
    #[serde(default)]
    pub model_type: Option<String>,
}

/// A loaded checkpoint: encoder config, extra metadata and a weight builder.
pub(crate) struct Checkpoint {
    pub config: Config,
    pub meta: CheckpointMeta,
    pub vb: VarBuilder<'static>,
}

impl Checkpoint {
    pub fn open(model_dir: &Path, device: &Device) -> Result<Self, ModelError> {
        let (config_path, weights_path) =
            checkpoint_files(model_dir).map_err(|e| ModelError::ModelLoadFailed {
                reason: e.to_string(),
            })?;

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ModelError::ModelLoadFailed {
                reason: format!("failed to parse {}: {}", config_path.display(), e),
            })?;
        let meta: CheckpointMeta =
            serde_json::from_str(&content).map_err(|e| ModelError::ModelLoadFailed {
                reason: format!("failed to parse {}: {}", config_path.display(), e),
            })?;

        if let Some(embedding_size) = meta.embedding_size
            && embedding_size != config.hidden_size
        {
            return Err(ModelError::Unsupported {
                reason: format!(
                    "embedding_size ({}) differs from hidden_size ({}); projected embeddings are not supported",
                    embedding_size, config.hidden_size
                ),
            });
        }

        // SAFETY: the weights file is treated as read-only for the lifetime of the mapping.
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        Ok(Self { config, meta, vb })
    }

    pub fn hidden_size(&self) -> usize {
        self.config.hidden_size
    }

    /// Loads the transformer encoder under whichever prefix the checkpoint uses.
    pub fn load_backbone(&self) -> Result<BertModel, ModelError> {
        let prefix = BACKBONE_PREFIXES.into_iter().find(|prefix| {
            self.vb
                .contains_tensor(&format!("{prefix}.embeddings.word_embeddings.weight"))
        });

        debug!(
            prefix = prefix.unwrap_or("<root>"),
            model_type = self.meta.model_type.as_deref().unwrap_or("unknown"),
            hidden_size = self.config.hidden_size,
            layers = self.config.num_hidden_layers,
            "Loading transformer backbone"
        );

        let model = match prefix {
            Some(prefix) => BertModel::load(self.vb.pp(prefix), &self.config)?,
            None => BertModel::load(self.vb.clone(), &self.config)?,
        };
        Ok(model)
    }
}

/// Input tensors for one encoded pair, each shaped `[1, seq_len]`.
pub(crate) struct InputTensors {
    pub input_ids: Tensor,
    pub type_ids: Tensor,
    pub attention_mask: Tensor,
}

impl InputTensors {
    pub fn new(encoded: &EncodedInput, device: &Device) -> Result<Self, ModelError> {
        let input_ids = Tensor::new(encoded.input_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoded.type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoded.attention_mask(), device)?.unsqueeze(0)?;
        Ok(Self {
            input_ids,
            type_ids,
            attention_mask,
        })
    }
}
