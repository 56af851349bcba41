//! Rear verification.
//!
//! Reconciles the sketch reader's `score_ext` with the intensive reader's
//! null margin into one `score_diff` and compares it against the configured
//! threshold `τ`. The combination arithmetic is a [`ScoreCombiner`] strategy;
//! [`rear_verify`] is a pure function of its scalar inputs, so the decision
//! can be tested without any model loaded.

pub mod combiner;
pub mod error;
pub mod types;
pub mod verifier;


pub use combiner::{DirectDifference, ScoreCombiner, WeightedDifference};
pub use error::ScoringError;
pub use types::{Agreement, VerificationResult, Vote};
pub use verifier::{RearVerifier, rear_verify};
