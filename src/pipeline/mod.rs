//! The `RetroReader` facade.
//!
//! One call runs: encode → sketch and intensive passes on separate blocking
//! lanes → join → rear verification → (if answerable) n-best aggregation →
//! [`ResultBundle`]. The whole call is bounded by the configured timeout and
//! can be cancelled with [`RetroReader::infer_with_cancel`].

pub mod error;
pub mod result;
pub mod retro;


pub use error::{InferenceError, LoadError};
pub use result::{Answer, AnswerReason, ResultBundle, SubmoduleOutputs};
pub use retro::RetroReader;
