//! Retrospective reader library crate.
//!
//! Answers a query against a passage and treats "no answer in this passage"
//! as a first-class outcome. Two submodules read the same encoded input:
//!
//! - the sketch reader votes on answerability for the whole passage;
//! - the intensive reader scores answer spans and its own null position.
//!
//! Rear verification folds both votes into `score_diff` and compares it with
//! the configured threshold. Only an accepted pair gets an n-best list.
//!
//! # Modules
//!
//! - [`config`] - [`ReaderConfig`] from YAML or `RETRO_*` variables
//! - [`encoding`] - [`QaEncoder`] adapters and [`EncodedInput`]
//! - [`model`] - candle-backed classifier and span extractor
//! - [`reader`] - the [`Reader`] trait, [`SketchReader`], [`IntensiveReader`]
//! - [`scoring`] - rear verification and [`ScoreCombiner`] strategies
//! - [`nbest`] - span ranking, dedup and softmax
//! - [`pipeline`] - the [`RetroReader`] facade and [`ResultBundle`]
//! - [`registry`] - [`ReaderRegistry`] of loaded readers
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use retro_reader::{ReaderConfig, RetroReader};
//!
//! let reader = RetroReader::load(ReaderConfig::from_env()?)?;
//! let bundle = reader
//!     .infer("What is the capital of France?", "Paris is the capital of France.", false)
//!     .await?;
//! println!("{}", bundle.answer);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod encoding;
pub mod model;
pub mod nbest;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod scoring;

pub use config::{CombinerConfig, ConfigError, ReaderConfig};
pub use constants::{ExampleSet, Language, NO_ANSWER, example_set};
pub use encoding::{BasicEncoder, EncodedInput, EncodingError, QaEncoder, TokenizerEncoder};
pub use model::{AnswerabilityClassifier, ModelError, SpanExtractor};
pub use nbest::{NBestList, SpanCandidate, aggregate, logit_margin, softmax};
pub use pipeline::{
    Answer, AnswerReason, InferenceError, LoadError, ResultBundle, RetroReader, SubmoduleOutputs,
};
pub use reader::{
    IntensiveOutput, IntensiveReader, RawSpan, Reader, ReaderError, ReaderKind, ReaderOutput,
    SketchReader, SketchScore,
};
pub use registry::ReaderRegistry;
pub use scoring::{
    Agreement, DirectDifference, RearVerifier, ScoreCombiner, ScoringError, VerificationResult,
    Vote, WeightedDifference, rear_verify,
};
