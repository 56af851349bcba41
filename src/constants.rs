//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.

use std::fmt;
use std::str::FromStr;

/// Default rear-verification threshold (`τ`).
///
/// Combined scores are logit-scale margins, so zero is the neutral point.
pub const DEFAULT_VERIFICATION_THRESHOLD: f32 = 0.0;

/// Default number of start/end positions kept when pruning the span surface.
pub const DEFAULT_N_BEST_SIZE: usize = 20;

/// Default number of predictions returned in the n-best list.
pub const DEFAULT_TOP_K: usize = DEFAULT_N_BEST_SIZE;

/// Default maximum answer length, in tokens.
pub const DEFAULT_MAX_ANSWER_LENGTH: usize = 30;

/// Default maximum encoded sequence length (query + context + specials).
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Default wall-clock budget for one inference call.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default weights for the weighted rear-verification combination.
pub const DEFAULT_BETA_EXT: f32 = 0.5;
pub const DEFAULT_BETA_INT: f32 = 0.5;

/// Sentinel surfaced to callers when no answer is returned.
pub const NO_ANSWER: &str = "No answer";

/// Model identifier used when a config does not name one.
pub const DEFAULT_MODEL_NAME: &str = "google/electra-large-discriminator";

pub const EN_EXAMPLE_QUERY: &str = "What is the capital of France?";
pub const EN_EXAMPLE_CONTEXT: &str = "Paris is the capital and most populous city of France. \
With an estimated population of over two million residents, Paris is the center of the \
Ile-de-France region and one of Europe's major centres of finance, diplomacy and commerce.";

pub const KO_EXAMPLE_QUERY: &str = "프랑스의 수도는 어디인가요?";
pub const KO_EXAMPLE_CONTEXT: &str = "파리는 프랑스의 수도이자 최대 도시이다. \
약 200만 명이 넘는 인구가 거주하며, 일드프랑스 지역의 중심지이자 유럽의 금융과 외교의 중심지 중 하나이다.";

/// Language of a pre-configured example set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ko" => Ok(Language::Ko),
            other => Err(format!("unsupported language '{other}' (expected 'en' or 'ko')")),
        }
    }
}

/// A pre-configured demonstration query and passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleSet {
    pub query: &'static str,
    pub context: &'static str,
}

/// Returns the example query/context pair for `language`.
pub fn example_set(language: Language) -> ExampleSet {
    match language {
        Language::En => ExampleSet {
            query: EN_EXAMPLE_QUERY,
            context: EN_EXAMPLE_CONTEXT,
        },
        Language::Ko => ExampleSet {
            query: KO_EXAMPLE_QUERY,
            context: KO_EXAMPLE_CONTEXT,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" KO ".parse::<Language>().unwrap(), Language::Ko);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_example_sets_are_distinct() {
        let en = example_set(Language::En);
        let ko = example_set(Language::Ko);

        assert_eq!(en.query, EN_EXAMPLE_QUERY);
        assert_ne!(en.context, ko.context);
        assert!(en.context.contains("Paris"));
    }

    #[test]
    fn test_defaults_consistent() {
        assert_eq!(DEFAULT_TOP_K, DEFAULT_N_BEST_SIZE);
        assert!(DEFAULT_MAX_ANSWER_LENGTH < DEFAULT_MAX_SEQ_LEN);
    }
}
