use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::constants::NO_ANSWER;
use crate::nbest::NBestList;
use crate::scoring::Agreement;

/// The single answer surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Span(String),
    /// Serialized as the `"No answer"` sentinel.
    NoAnswer,
}

impl Answer {
    pub fn as_str(&self) -> &str {
        match self {
            Answer::Span(text) => text,
            Answer::NoAnswer => NO_ANSWER,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Span(text) => Some(text),
            Answer::NoAnswer => None,
        }
    }

    pub fn is_no_answer(&self) -> bool {
        matches!(self, Answer::NoAnswer)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Why the bundle carries the answer it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerReason {
    /// Verified answerable and the top span decoded to text.
    Answered,
    /// Rear verification rejected the pair.
    Unanswerable,
    /// Verified answerable, but every candidate decoded to empty text.
    DegenerateSpans,
}

/// Intermediate scores, included on request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubmoduleOutputs {
    pub null_score: f32,
    /// `-inf` (serialized as `null`) when no span survived pruning.
    pub best_span_score: f32,
    pub null_margin: f32,
    pub is_answerable: bool,
    pub agreement: Agreement,
    /// Log-odds of the intensive reader's answerability pool, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_answer_margin: Option<f32>,
}

/// Result of one inference call. Created once per call and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBundle {
    pub answer: Answer,
    pub reason: AnswerReason,
    pub score_diff: f32,
    pub score_ext: f32,
    pub is_answerable: bool,
    /// Full list with submodule outputs, otherwise at most the top answer.
    pub nbest_preds: NBestList,
    pub submodule_outputs: Option<SubmoduleOutputs>,
}

impl ResultBundle {
    pub fn has_submodule_outputs(&self) -> bool {
        self.submodule_outputs.is_some()
    }
}

impl Serialize for ResultBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.submodule_outputs.is_some() { 8 } else { 7 };
        let mut state = serializer.serialize_struct("ResultBundle", fields)?;
        state.serialize_field("answer", &self.answer)?;
        state.serialize_field("reason", &self.reason)?;
        state.serialize_field("score_diff", &self.score_diff)?;
        state.serialize_field("score_ext", &self.score_ext)?;
        state.serialize_field("is_answerable", &self.is_answerable)?;
        state.serialize_field("nbest_preds", &self.nbest_preds)?;
        state.serialize_field("has_submodule_outputs", &self.has_submodule_outputs())?;
        match &self.submodule_outputs {
            Some(outputs) => state.serialize_field("submodule_outputs", outputs)?,
            None => state.skip_field("submodule_outputs")?,
        }
        state.end()
    }
}
