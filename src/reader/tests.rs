use super::*;
use crate::encoding::{BasicEncoder, EncodedInput, QaEncoder};
use candle_core::Device;
use std::path::Path;

const PARIS_CONTEXT: &str = "Paris is the capital of France.";
const CATS_CONTEXT: &str = "Cats are mammals.";
const QUERY: &str = "What is the capital of France?";

fn encode(query: &str, context: &str) -> EncodedInput {
    BasicEncoder::new(64).encode(query, context).unwrap()
}

#[test]
fn test_stub_sketch_scores() {
    let reader = SketchReader::stub();

    let answerable = reader.score(&encode(QUERY, PARIS_CONTEXT)).unwrap();
    assert_eq!(answerable.score_ext, 4.0);

    let unanswerable = reader.score(&encode(QUERY, CATS_CONTEXT)).unwrap();
    assert_eq!(unanswerable.score_ext, -4.0);

    let partial = reader
        .score(&encode(QUERY, "The capital city is large."))
        .unwrap();
    assert_eq!(partial.score_ext, 0.0);
}

#[test]
fn test_stub_sketch_is_deterministic() {
    let reader = SketchReader::stub();
    let encoded = encode(QUERY, PARIS_CONTEXT);
    assert_eq!(
        reader.score(&encoded).unwrap().score_ext.to_bits(),
        reader.score(&encoded).unwrap().score_ext.to_bits()
    );
}

#[test]
fn test_stub_intensive_answerable() {
    let reader = IntensiveReader::stub(20, 30);
    let output = reader.score(&encode(QUERY, PARIS_CONTEXT)).unwrap();

    assert_eq!(output.null_score, 0.0);
    assert_eq!(output.best_span_score(), 4.0);
    assert_eq!(output.null_margin(), -4.0);
    // 7 context tokens -> 7 * 8 / 2 forward spans
    assert_eq!(output.spans.len(), 28);
    assert_eq!(output.spans[0], RawSpan::new(9, 9, 4.0));
    assert!(output.has_answer_logits.is_none());
}

#[test]
fn test_stub_intensive_unanswerable() {
    let reader = IntensiveReader::stub(20, 30);
    let output = reader.score(&encode(QUERY, CATS_CONTEXT)).unwrap();

    assert_eq!(output.null_score, 4.0);
    assert_eq!(output.best_span_score(), 2.0);
    assert_eq!(output.null_margin(), 2.0);
}

#[test]
fn test_prune_spans_respects_n_best() {
    let encoded = encode(QUERY, PARIS_CONTEXT);
    let logits = stub::span_logits(&encoded);

    // top-2 starts/ends are the "Paris" token and the no-answer position
    let spans = prune_spans(&logits, &logits, &encoded, 2, 30);
    assert_eq!(spans, vec![RawSpan::new(9, 9, 4.0)]);
}

#[test]
fn test_prune_spans_respects_max_answer_length() {
    let encoded = encode(QUERY, PARIS_CONTEXT);
    let logits = stub::span_logits(&encoded);

    let spans = prune_spans(&logits, &logits, &encoded, 20, 1);
    assert_eq!(spans.len(), 7);
    assert!(spans.iter().all(|span| span.start == span.end));

    let spans = prune_spans(&logits, &logits, &encoded, 20, 3);
    assert!(spans.iter().all(|span| span.token_len() <= 3));
}

#[test]
fn test_prune_spans_skips_non_context_and_backwards() {
    let encoded = encode(QUERY, PARIS_CONTEXT);
    // Make the query tokens and a backwards pair the most attractive.
    let mut start = vec![0.0_f32; encoded.len()];
    let mut end = vec![0.0_f32; encoded.len()];
    start[3] = 50.0;
    end[3] = 50.0;
    start[14] = 10.0;
    end[9] = 10.0;

    let spans = prune_spans(&start, &end, &encoded, 3, 30);

    assert!(spans.iter().all(|s| encoded.is_context_token(s.start)));
    assert!(spans.iter().all(|s| encoded.is_context_token(s.end)));
    assert!(spans.iter().all(|s| s.end >= s.start));
    assert!(!spans.iter().any(|s| s.start == 14 && s.end == 9));
}

#[test]
fn test_prune_spans_ignores_nan_logits() {
    let encoded = encode(QUERY, PARIS_CONTEXT);
    let mut logits = stub::span_logits(&encoded);
    logits[9] = f32::NAN;

    let spans = prune_spans(&logits, &logits, &encoded, 20, 30);
    assert!(spans.iter().all(|s| s.start != 9 && s.end != 9));
    assert!(spans.iter().all(|s| !s.raw_score.is_nan()));
}

#[test]
fn test_token_len() {
    assert_eq!(RawSpan::new(9, 9, 0.0).token_len(), 1);
    assert_eq!(RawSpan::new(9, 11, 0.0).token_len(), 3);
    assert_eq!(RawSpan::new(14, 9, 0.0).token_len(), 0);
}

#[test]
fn test_null_margin_without_spans() {
    let output = IntensiveOutput {
        null_score: 1.0,
        spans: vec![],
        has_answer_logits: None,
    };
    assert_eq!(output.best_span_score(), f32::NEG_INFINITY);
    assert_eq!(output.null_margin(), f32::INFINITY);
}

#[test]
fn test_reader_trait_dispatch() {
    let encoded = encode(QUERY, PARIS_CONTEXT);
    let readers: Vec<Box<dyn Reader>> = vec![
        Box::new(SketchReader::stub()),
        Box::new(IntensiveReader::stub(20, 30)),
    ];

    let kinds: Vec<ReaderKind> = readers
        .iter()
        .map(|reader| reader.read(&encoded).unwrap().kind())
        .collect();

    assert_eq!(kinds, vec![ReaderKind::Sketch, ReaderKind::Intensive]);
    assert!(readers.iter().all(|reader| !reader.is_model_loaded()));
    assert_eq!(readers[0].kind().to_string(), "sketch");
}

#[test]
fn test_load_without_path_is_stub() {
    let sketch = SketchReader::load(None, &Device::Cpu).unwrap();
    assert!(!sketch.is_model_loaded());

    let intensive = IntensiveReader::load(None, &Device::Cpu, 20, 30).unwrap();
    assert!(!intensive.is_model_loaded());
}

#[test]
fn test_load_missing_checkpoint_fails() {
    let result = SketchReader::load(Some(Path::new("/nonexistent/sketch")), &Device::Cpu);
    assert!(matches!(result, Err(ReaderError::Model(_))));

    let result =
        IntensiveReader::load(Some(Path::new("/nonexistent/intensive")), &Device::Cpu, 20, 30);
    assert!(matches!(result, Err(ReaderError::Model(_))));
}

#[test]
fn test_stub_helpers() {
    assert_eq!(stub::normalize("France."), Some("france".to_string()));
    assert_eq!(stub::normalize("?"), None);
    assert!(stub::is_stop_word("the"));

    let words = stub::content_words(QUERY);
    assert_eq!(words.len(), 2);
    assert!(words.contains("capital"));
    assert!(words.contains("france"));
}
