//! Neural scorers behind the readers.
//!
//! Both readers share a transformer encoder loaded with candle's BERT
//! implementation (ELECTRA discriminators use the same layout):
//!
//! - [`AnswerabilityClassifier`] backs the sketch reader.
//! - [`SpanExtractor`] backs the intensive reader.

pub(crate) mod backbone;
/// Two-label answerability classifier.
pub mod classifier;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Start/end span extractor.
pub mod span;
/// Tokenizer/checkpoint loading helpers.
pub mod utils;


pub use classifier::AnswerabilityClassifier;
pub use device::{Accelerator, select_device};
pub use error::ModelError;
pub use span::{SpanExtractor, SpanLogits};
