//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Template loading and validation (plan)
//! - Escalation across engines (runtime)
//! - Normalization, validation and confidence scoring of captured values
//! - Embedding similarity matching and intent classification

pub mod classify;
pub mod confidence;
pub mod matcher;
pub mod normalize;
pub mod plan;
pub mod prompts;
pub mod runtime;
pub mod validate;

pub use classify::IntentClassifier;
pub use matcher::{cosine_similarity, CandidateScore, Classification, MatchScore};
pub use normalize::{NormalizationKind, Normalizer};
pub use plan::{ExtractionPlan, Verdict};
pub use prompts::{format_extract_prompt, EXTRACT_PROMPT};
pub use runtime::ExtractionRuntime;
pub use validate::{Validation, Validator};
