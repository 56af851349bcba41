//! End-to-end tests over the public API with stub and scripted readers.

mod common;

use std::sync::Arc;

use retro_reader::{
    Answer, AnswerReason, BasicEncoder, CombinerConfig, IntensiveOutput, IntensiveReader,
    Language, NO_ANSWER, RawSpan, ReaderConfig, ReaderRegistry, RetroReader, SketchReader,
    example_set,
};

use common::{CATS, PARIS, QUERY, ScriptedIntensive, ScriptedSketch};

fn stub_reader() -> RetroReader {
    RetroReader::load(ReaderConfig::stub()).expect("stub reader should load")
}

fn scripted(config: ReaderConfig, score_ext: f32, intensive: IntensiveOutput) -> RetroReader {
    RetroReader::from_parts(
        config,
        Arc::new(BasicEncoder::new(64)),
        Arc::new(ScriptedSketch(score_ext)),
        Arc::new(ScriptedIntensive(intensive)),
    )
    .expect("scripted reader should assemble")
}

#[tokio::test]
async fn test_paris_is_answered() {
    let reader = stub_reader();
    let bundle = reader.infer(QUERY, PARIS, true).await.unwrap();

    assert!(bundle.is_answerable);
    assert!(bundle.score_diff > reader.verifier().threshold());
    assert_eq!(bundle.answer.as_str(), "Paris");
    assert_eq!(bundle.reason, AnswerReason::Answered);
}

#[tokio::test]
async fn test_cats_has_no_answer() {
    let reader = stub_reader();
    let bundle = reader.infer(QUERY, CATS, true).await.unwrap();

    assert!(!bundle.is_answerable);
    assert_eq!(bundle.answer.as_str(), NO_ANSWER);
    assert!(bundle.nbest_preds.is_empty());
}

#[tokio::test]
async fn test_top_k_counts_distinct_text() {
    // [CLS] What is the capital of France ? [SEP] Paris is Paris . [SEP]
    //   0    1   2   3     4    5    6    7   8    9   10   11  12  13
    let context = "Paris is Paris.";
    let intensive = IntensiveOutput {
        null_score: 0.0,
        spans: vec![
            RawSpan::new(9, 9, 6.0),
            RawSpan::new(11, 11, 5.0),
            RawSpan::new(9, 11, 4.0),
            RawSpan::new(10, 11, 3.0),
            RawSpan::new(12, 12, 2.0),
        ],
        has_answer_logits: None,
    };
    let reader = scripted(ReaderConfig::stub().with_top_k(3), 5.0, intensive);

    let bundle = reader.infer(QUERY, context, true).await.unwrap();
    let texts: Vec<&str> = bundle.nbest_preds.iter().map(|c| c.text.as_str()).collect();

    assert_eq!(texts, vec!["Paris", "Paris is Paris", "is Paris"]);
}

#[tokio::test]
async fn test_nbest_properties() {
    let reader = RetroReader::load(ReaderConfig::stub().with_top_k(5)).unwrap();
    let bundle = reader.infer(QUERY, PARIS, true).await.unwrap();
    let nbest = bundle.nbest_preds.as_slice();

    assert!(!nbest.is_empty() && nbest.len() <= 5);

    let total: f32 = nbest.iter().map(|c| c.probability).sum();
    assert!((total - 1.0).abs() < 1e-5);

    for pair in nbest.windows(2) {
        assert!(pair[0].probability >= pair[1].probability);
        assert_ne!(pair[0].text, pair[1].text);
    }

    for candidate in nbest {
        let located = &PARIS[candidate.start_offset..candidate.end_offset];
        assert_eq!(located, candidate.text);
        assert!(PARIS.contains(&candidate.text));
    }
}

#[tokio::test]
async fn test_strong_unanswerable_agreement_never_ranks_spans() {
    let intensive = IntensiveOutput {
        null_score: 20.0,
        spans: vec![RawSpan::new(9, 9, 1.0)],
        has_answer_logits: None,
    };
    let reader = scripted(ReaderConfig::stub(), -10.0, intensive);

    let bundle = reader.infer(QUERY, PARIS, true).await.unwrap();

    assert!(!bundle.is_answerable);
    assert_eq!(bundle.answer, Answer::NoAnswer);
    assert!(bundle.nbest_preds.is_empty());
}

#[tokio::test]
async fn test_unanswerable_agreement_holds_under_negative_threshold() {
    let intensive = IntensiveOutput {
        null_score: 5.0,
        spans: vec![RawSpan::new(9, 9, 1.0)],
        has_answer_logits: None,
    };
    let reader = scripted(ReaderConfig::stub().with_threshold(-5.0), -4.0, intensive);

    let bundle = reader.infer(QUERY, PARIS, true).await.unwrap();

    // weighted: 0.5 * -4 - 0.5 * 4 clears tau = -5 on its own
    assert_eq!(bundle.score_diff, -4.0);
    assert!(!bundle.is_answerable);
    assert_eq!(bundle.answer, Answer::NoAnswer);
    assert_eq!(bundle.reason, AnswerReason::Unanswerable);
    assert!(bundle.nbest_preds.is_empty());
}

#[tokio::test]
async fn test_repeated_calls_are_bit_identical() {
    let reader = stub_reader();
    for context in [PARIS, CATS] {
        let first = reader.infer(QUERY, context, true).await.unwrap();
        let second = reader.infer(QUERY, context, true).await.unwrap();
        assert_eq!(first.score_diff.to_bits(), second.score_diff.to_bits());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[tokio::test]
async fn test_combiner_strategy_from_config() {
    let direct = RetroReader::load(ReaderConfig::stub().with_combiner(CombinerConfig::Direct))
        .unwrap()
        .infer(QUERY, CATS, false)
        .await
        .unwrap();
    let weighted = stub_reader().infer(QUERY, CATS, false).await.unwrap();

    assert_eq!(direct.score_diff, -6.0);
    assert_eq!(weighted.score_diff, -3.0);
    assert_eq!(direct.score_ext, weighted.score_ext);
}

#[tokio::test]
async fn test_yaml_config_drives_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reader.yaml");
    std::fs::write(
        &path,
        "model_name: yaml-reader\nthreshold: 5.0\ntop_k: 2\ncombiner:\n  kind: direct\n",
    )
    .unwrap();

    let config = ReaderConfig::from_yaml_file(&path).unwrap();
    let reader = RetroReader::load(config).unwrap();
    assert_eq!(reader.model_name(), "yaml-reader");

    // direct: 4 - (-4) = 8 > 5
    let bundle = reader.infer(QUERY, PARIS, true).await.unwrap();
    assert_eq!(bundle.score_diff, 8.0);
    assert_eq!(bundle.nbest_preds.len(), 2);
}

#[tokio::test]
async fn test_registry_shares_loaded_reader() {
    let registry = Arc::new(ReaderRegistry::new());

    let mut tasks = Vec::new();
    for context in [PARIS, CATS, PARIS] {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let reader = registry.get_or_load_config(ReaderConfig::stub()).unwrap();
            reader.infer(QUERY, context, false).await.unwrap()
        }));
    }

    let mut answers = Vec::new();
    for task in tasks {
        answers.push(task.await.unwrap().answer.as_str().to_string());
    }

    assert_eq!(answers, vec!["Paris", NO_ANSWER, "Paris"]);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_example_sets_run() {
    let reader = stub_reader();
    for language in [Language::En, Language::Ko] {
        let example = example_set(language);
        let bundle = reader
            .infer(example.query, example.context, false)
            .await
            .unwrap();
        assert!(bundle.score_ext.is_finite());
        assert!(bundle.score_diff.is_finite() || !bundle.is_answerable);
    }
}

#[test]
fn test_from_parts_with_stub_readers() {
    let reader = RetroReader::from_parts(
        ReaderConfig::stub(),
        Arc::new(BasicEncoder::new(128)),
        Arc::new(SketchReader::stub()),
        Arc::new(IntensiveReader::stub(5, 10)),
    )
    .unwrap();
    assert!(reader.is_stub());
}
