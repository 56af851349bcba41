use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::ReaderConfig;
use crate::encoding::{BasicEncoder, EncodedInput, QaEncoder, TokenizerEncoder};
use crate::model::select_device;
use crate::nbest::{NBestList, aggregate, logit_margin};
use crate::reader::{
    IntensiveOutput, IntensiveReader, Reader, ReaderError, ReaderKind, ReaderOutput,
    SketchReader, SketchScore,
};
use crate::scoring::{RearVerifier, VerificationResult};

use super::error::{InferenceError, LoadError};
use super::result::{Answer, AnswerReason, ResultBundle, SubmoduleOutputs};

/// Retrospective reader: sketch reading, intensive reading and rear verification.
///
/// Holds only read-only state, so one instance serves any number of
/// concurrent [`infer`](Self::infer) calls.
pub struct RetroReader {
    config: Arc<ReaderConfig>,
    encoder: Arc<dyn QaEncoder>,
    sketch: Arc<dyn Reader>,
    intensive: Arc<dyn Reader>,
    verifier: RearVerifier,
}

impl std::fmt::Debug for RetroReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetroReader")
            .field("model_name", &self.config.model_name)
            .field("encoder", &self.encoder.name())
            .field("sketch", &self.sketch)
            .field("intensive", &self.intensive)
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl RetroReader {
    /// Validates `config` and loads the encoder and both readers.
    pub fn load(config: ReaderConfig) -> Result<Self, LoadError> {
        config.validate()?;

        let checkpoints: Vec<&Path> = [&config.sketch_model_path, &config.intensive_model_path]
            .into_iter()
            .filter_map(|path| path.as_deref())
            .collect();
        let device = select_device(&checkpoints);

        let encoder: Arc<dyn QaEncoder> = match config.resolved_tokenizer_path() {
            Some(path) => Arc::new(TokenizerEncoder::load(&path, config.max_seq_length)?),
            None => Arc::new(BasicEncoder::new(config.max_seq_length)),
        };

        let sketch = SketchReader::load(config.sketch_model_path.as_deref(), &device)?;
        let intensive = IntensiveReader::load(
            config.intensive_model_path.as_deref(),
            &device,
            config.n_best_size,
            config.max_answer_length,
        )?;

        info!(
            model_name = %config.model_name,
            encoder = encoder.name(),
            sketch_loaded = sketch.is_model_loaded(),
            intensive_loaded = intensive.is_model_loaded(),
            "Retro reader loaded"
        );

        Self::from_parts(config, encoder, Arc::new(sketch), Arc::new(intensive))
    }

    /// Assembles a reader from already-built parts.
    pub fn from_parts(
        config: ReaderConfig,
        encoder: Arc<dyn QaEncoder>,
        sketch: Arc<dyn Reader>,
        intensive: Arc<dyn Reader>,
    ) -> Result<Self, LoadError> {
        for (reader, expected) in [
            (&sketch, ReaderKind::Sketch),
            (&intensive, ReaderKind::Intensive),
        ] {
            if reader.kind() != expected {
                return Err(ReaderError::KindMismatch {
                    expected,
                    actual: reader.kind(),
                }
                .into());
            }
        }

        let verifier = RearVerifier::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            encoder,
            sketch,
            intensive,
            verifier,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    pub fn verifier(&self) -> &RearVerifier {
        &self.verifier
    }

    /// `true` when neither reader has weights loaded.
    pub fn is_stub(&self) -> bool {
        !self.sketch.is_model_loaded() && !self.intensive.is_model_loaded()
    }

    /// Answers `query` against `context`.
    ///
    /// `return_submodule_outputs` controls whether the full n-best list and
    /// the intermediate scores are included. `score_ext` and `score_diff`
    /// are always present.
    pub async fn infer(
        &self,
        query: &str,
        context: &str,
        return_submodule_outputs: bool,
    ) -> Result<ResultBundle, InferenceError> {
        self.infer_with_cancel(
            query,
            context,
            return_submodule_outputs,
            std::future::pending::<()>(),
        )
        .await
    }

    /// Like [`infer`](Self::infer), but gives up with
    /// [`InferenceError::Cancelled`] as soon as `cancel` completes.
    ///
    /// Reader passes that have not started yet are skipped; passes already
    /// running finish in the background and their output is discarded.
    pub async fn infer_with_cancel<C>(
        &self,
        query: &str,
        context: &str,
        return_submodule_outputs: bool,
        cancel: C,
    ) -> Result<ResultBundle, InferenceError>
    where
        C: Future<Output = ()>,
    {
        let call_id = Uuid::new_v4();
        let span = info_span!(
            "retro_reader.infer",
            %call_id,
            model_name = %self.config.model_name
        );

        let stop = Arc::new(AtomicBool::new(false));
        let timeout = self.config.timeout();
        let started = Instant::now();

        let outcome = async {
            let pipeline = self.run(query, context, return_submodule_outputs, stop.clone());
            tokio::select! {
                result = tokio::time::timeout(timeout, pipeline) => match result {
                    Ok(result) => result,
                    Err(_) => {
                        stop.store(true, Ordering::Release);
                        Err(InferenceError::Timeout {
                            elapsed: started.elapsed(),
                        })
                    }
                },
                () = cancel => {
                    stop.store(true, Ordering::Release);
                    Err(InferenceError::Cancelled)
                }
            }
        }
        .instrument(span.clone())
        .await;

        let _enter = span.enter();
        match &outcome {
            Ok(bundle) => info!(
                reason = ?bundle.reason,
                score_diff = bundle.score_diff,
                score_ext = bundle.score_ext,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Inference complete"
            ),
            Err(error) => {
                stop.store(true, Ordering::Release);
                warn!(
                    error = %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Inference failed"
                );
            }
        }

        outcome
    }

    async fn run(
        &self,
        query: &str,
        context: &str,
        return_submodule_outputs: bool,
        stop: Arc<AtomicBool>,
    ) -> Result<ResultBundle, InferenceError> {
        let encoded = Arc::new(self.encoder.encode(query, context)?);
        debug!(
            seq_len = encoded.len(),
            context_tokens = encoded.context_token_count(),
            truncated = encoded.is_truncated(),
            "Encoded input"
        );

        // Both passes only need the encoded input; join before verification.
        let (sketch, intensive) = tokio::try_join!(
            run_lane(self.sketch.clone(), encoded.clone(), stop.clone()),
            run_lane(self.intensive.clone(), encoded.clone(), stop.clone()),
        )?;
        let sketch = expect_sketch(sketch)?;
        let intensive = expect_intensive(intensive)?;

        let verification = self.verifier.verify(&sketch, &intensive);

        // Cancellation point between the join and span ranking.
        tokio::task::yield_now().await;

        Ok(self.assemble(
            &encoded,
            &sketch,
            &intensive,
            &verification,
            return_submodule_outputs,
        ))
    }

    fn assemble(
        &self,
        encoded: &EncodedInput,
        sketch: &SketchScore,
        intensive: &IntensiveOutput,
        verification: &VerificationResult,
        return_submodule_outputs: bool,
    ) -> ResultBundle {
        let (answer, reason, mut nbest_preds) = if verification.is_answerable {
            let nbest = aggregate(&intensive.spans, encoded, self.config.top_k);
            match nbest.top().map(|top| top.text.clone()) {
                Some(text) => (Answer::Span(text), AnswerReason::Answered, nbest),
                None => {
                    warn!(
                        candidates = intensive.spans.len(),
                        score_diff = verification.score_diff,
                        "Answerable but no span decoded to text, falling back to no answer"
                    );
                    (
                        Answer::NoAnswer,
                        AnswerReason::DegenerateSpans,
                        NBestList::empty(),
                    )
                }
            }
        } else {
            debug!(
                agreement = ?verification.agreement(),
                "Skipping span ranking for unanswerable pair"
            );
            (
                Answer::NoAnswer,
                AnswerReason::Unanswerable,
                NBestList::empty(),
            )
        };

        if !return_submodule_outputs {
            nbest_preds.truncate(1);
        }

        let submodule_outputs = return_submodule_outputs.then(|| SubmoduleOutputs {
            null_score: intensive.null_score,
            best_span_score: intensive.best_span_score(),
            null_margin: intensive.null_margin(),
            is_answerable: verification.is_answerable,
            agreement: verification.agreement(),
            has_answer_margin: intensive
                .has_answer_logits
                .map(|logits| logit_margin(logits, 1)),
        });

        ResultBundle {
            answer,
            reason,
            score_diff: verification.score_diff,
            score_ext: sketch.score_ext,
            is_answerable: verification.is_answerable,
            nbest_preds,
            submodule_outputs,
        }
    }
}

/// Runs one reader pass on the blocking pool unless the call was already stopped.
async fn run_lane(
    reader: Arc<dyn Reader>,
    encoded: Arc<EncodedInput>,
    stop: Arc<AtomicBool>,
) -> Result<ReaderOutput, InferenceError> {
    let kind = reader.kind();
    let span = tracing::Span::current();

    let output = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        if stop.load(Ordering::Acquire) {
            debug!(reader = %kind, "Call stopped before reader pass");
            return None;
        }
        let started = Instant::now();
        let result = reader.read(&encoded);
        debug!(
            reader = %kind,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reader pass finished"
        );
        Some(result)
    })
    .await
    .map_err(|e| InferenceError::TaskFailed {
        kind,
        reason: e.to_string(),
    })?;

    match output {
        Some(result) => Ok(result?),
        None => Err(InferenceError::Cancelled),
    }
}

fn expect_sketch(output: ReaderOutput) -> Result<SketchScore, InferenceError> {
    match output {
        ReaderOutput::Sketch(score) => Ok(score),
        other => Err(ReaderError::KindMismatch {
            expected: ReaderKind::Sketch,
            actual: other.kind(),
        }
        .into()),
    }
}

fn expect_intensive(output: ReaderOutput) -> Result<IntensiveOutput, InferenceError> {
    match output {
        ReaderOutput::Intensive(output) => Ok(output),
        other => Err(ReaderError::KindMismatch {
            expected: ReaderKind::Intensive,
            actual: other.kind(),
        }
        .into()),
    }
}
