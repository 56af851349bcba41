//! The two submodules of the retrospective reader.
//!
//! Both implement [`Reader`], so the pipeline can run them side by side and
//! join on completion without caring which is which:
//!
//! - [`SketchReader`] emits a single answerability score (`score_ext`).
//! - [`IntensiveReader`] emits a pruned span surface and a null score.
//!
//! Each has a `Model` backend (candle checkpoint) and a lexical `Stub`
//! backend used when no weights are configured.

pub mod error;
pub mod intensive;
pub mod sketch;
pub(crate) mod stub;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReaderError;
pub use intensive::{IntensiveReader, prune_spans};
pub use sketch::SketchReader;
pub use types::{IntensiveOutput, RawSpan, ReaderKind, ReaderOutput, SketchScore};

use crate::encoding::EncodedInput;

/// A scoring pass over one encoded `(query, context)` pair.
///
/// Implementations hold read-only weights and are shared across concurrent calls.
pub trait Reader: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ReaderKind;

    fn read(&self, encoded: &EncodedInput) -> Result<ReaderOutput, ReaderError>;

    /// `false` for stub backends.
    fn is_model_loaded(&self) -> bool;
}
