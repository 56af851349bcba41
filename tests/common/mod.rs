//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use retro_reader::{EncodedInput, IntensiveOutput, Reader, ReaderError, ReaderKind, ReaderOutput, SketchScore};

pub const QUERY: &str = "What is the capital of France?";
pub const PARIS: &str = "Paris is the capital of France.";
pub const CATS: &str = "Cats are mammals.";

/// Sketch reader that always returns the same score.
#[derive(Debug)]
pub struct ScriptedSketch(pub f32);

impl Reader for ScriptedSketch {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Sketch
    }

    fn read(&self, _: &EncodedInput) -> Result<ReaderOutput, ReaderError> {
        Ok(ReaderOutput::Sketch(SketchScore { score_ext: self.0 }))
    }

    fn is_model_loaded(&self) -> bool {
        false
    }
}

/// Intensive reader that always returns the same surface.
#[derive(Debug)]
pub struct ScriptedIntensive(pub IntensiveOutput);

impl Reader for ScriptedIntensive {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Intensive
    }

    fn read(&self, _: &EncodedInput) -> Result<ReaderOutput, ReaderError> {
        Ok(ReaderOutput::Intensive(self.0.clone()))
    }

    fn is_model_loaded(&self) -> bool {
        false
    }
}

pub mod checkpoint {
    use super::*;

    pub const HIDDEN: usize = 8;
    const INTERMEDIATE: usize = 16;
    const VOCAB: usize = 32;
    const MAX_POSITIONS: usize = 64;

    fn zeros(shape: &[usize]) -> Tensor {
        Tensor::zeros(shape, DType::F32, &Device::Cpu).unwrap()
    }

    pub fn vector(values: &[f32]) -> Tensor {
        Tensor::new(values, &Device::Cpu).unwrap()
    }

    pub fn zero_linear(tensors: &mut HashMap<String, Tensor>, name: &str, out_dim: usize, in_dim: usize) {
        tensors.insert(format!("{name}.weight"), zeros(&[out_dim, in_dim]));
        tensors.insert(format!("{name}.bias"), zeros(&[out_dim]));
    }

    /// Linear layer with zero weights, so its output is exactly `bias`.
    pub fn bias_only(tensors: &mut HashMap<String, Tensor>, name: &str, bias: &[f32]) {
        tensors.insert(format!("{name}.weight"), zeros(&[bias.len(), HIDDEN]));
        tensors.insert(format!("{name}.bias"), vector(bias));
    }

    /// Writes a one-layer ELECTRA checkpoint whose encoder outputs all zeros.
    pub fn write(dir: &Path, heads: HashMap<String, Tensor>) {
        let mut tensors = heads;
        let p = |name: &str| format!("electra.{name}");

        tensors.insert(p("embeddings.word_embeddings.weight"), zeros(&[VOCAB, HIDDEN]));
        tensors.insert(
            p("embeddings.position_embeddings.weight"),
            zeros(&[MAX_POSITIONS, HIDDEN]),
        );
        tensors.insert(p("embeddings.token_type_embeddings.weight"), zeros(&[2, HIDDEN]));
        tensors.insert(p("embeddings.LayerNorm.weight"), zeros(&[HIDDEN]));
        tensors.insert(p("embeddings.LayerNorm.bias"), zeros(&[HIDDEN]));

        let layer = p("encoder.layer.0");
        for name in ["query", "key", "value"] {
            zero_linear(&mut tensors, &format!("{layer}.attention.self.{name}"), HIDDEN, HIDDEN);
        }
        zero_linear(&mut tensors, &format!("{layer}.attention.output.dense"), HIDDEN, HIDDEN);
        zero_linear(&mut tensors, &format!("{layer}.intermediate.dense"), INTERMEDIATE, HIDDEN);
        zero_linear(&mut tensors, &format!("{layer}.output.dense"), HIDDEN, INTERMEDIATE);
        for norm in ["attention.output.LayerNorm", "output.LayerNorm"] {
            tensors.insert(format!("{layer}.{norm}.weight"), zeros(&[HIDDEN]));
            tensors.insert(format!("{layer}.{norm}.bias"), zeros(&[HIDDEN]));
        }

        candle_core::safetensors::save(&tensors, dir.join("model.safetensors")).unwrap();

        let config = serde_json::json!({
            "vocab_size": VOCAB,
            "hidden_size": HIDDEN,
            "num_hidden_layers": 1,
            "num_attention_heads": 2,
            "intermediate_size": INTERMEDIATE,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "max_position_embeddings": MAX_POSITIONS,
            "type_vocab_size": 2,
            "initializer_range": 0.02,
            "layer_norm_eps": 1e-12,
            "pad_token_id": 0,
            "model_type": "electra"
        });
        std::fs::write(dir.join("config.json"), config.to_string()).unwrap();
    }

    /// Writes a word-level `tokenizer.json` covering the Paris example.
    pub fn write_tokenizer(dir: &Path) {
        let words = [
            "What", "is", "the", "capital", "of", "France", "?", "Paris", ".",
        ];
        let mut vocab = serde_json::Map::new();
        vocab.insert("[UNK]".to_string(), 0.into());
        vocab.insert("[CLS]".to_string(), 1.into());
        vocab.insert("[SEP]".to_string(), 2.into());
        for (idx, word) in words.iter().enumerate() {
            vocab.insert((*word).to_string(), (idx as u64 + 3).into());
        }

        let json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": {
                "type": "BertProcessing",
                "sep": ["[SEP]", 2],
                "cls": ["[CLS]", 1]
            },
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });
        std::fs::write(dir.join("tokenizer.json"), json.to_string()).unwrap();
    }
}
