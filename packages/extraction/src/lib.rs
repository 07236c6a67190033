//! Contract-Driven Extraction Runtime
//!
//! Extracts structured values from a single free-text utterance according to
//! a declarative semantic contract, by escalating across engines of
//! increasing cost: regex, rules, NER, embedding similarity and LLM.
//!
//! # Design Philosophy
//!
//! - Contracts describe *what* to extract; templates say *which engines*
//!   may try and in what order
//! - Cheap engines first, the first valid result wins
//! - Engine failures are data, not exceptions: a failing engine is a no-match
//! - Configuration is validated once, at load time
//!
//! # Usage
//!
//! ```rust,ignore
//! use contract_extraction::{ExtractionRuntime, ExtractionTemplate};
//! use contract_extraction::testing::MockLlm;
//!
//! let runtime = ExtractionRuntime::new().with_llm(Arc::new(MockLlm::new()));
//! let template = ExtractionTemplate::from_json(&json)?;
//!
//! let plan = runtime.load(&template)?;
//! let result = runtime.extract(&plan, "born 15/04/2020").await;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Contract, engine configuration, policy and result types
//! - [`traits`] - Engine, provider and store abstractions
//! - [`engines`] - The five engine implementations
//! - [`pipeline`] - Loading, escalation, normalization, validation, matching
//! - [`stores`] - Embedding store and LLM response cache
//! - [`testing`] - Mock providers for testing

pub mod engines;
pub mod error;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{
    ConfigError, ConfigResult, EngineError, EngineResult, ExtractionError, FieldError, Result,
};
pub use traits::{
    engine::Engine,
    provider::{EmbeddingProvider, LlmProvider, NerEntity, NerProvider},
    store::EmbeddingStore,
};
pub use types::{
    config::{EscalationMode, PriorityOrdering, RuntimeConfig},
    contract::{
        EntityInfo, FieldConstraint, OutputCanonical, OutputFormat, SemanticContract, Subentity,
    },
    embedding::{EmbeddedExample, IntentDefinition, TrainedExamples},
    engine::{EngineConfig, EngineSettings, EngineType, Rule, RuleAction, RuleCondition},
    policy::{EscalationEntry, EscalationPolicy},
    result::{EngineOutcome, ExtractionRequest, ExtractionResult, RawCapture, Values},
    template::ExtractionTemplate,
};

// Re-export the runtime
pub use pipeline::{ExtractionPlan, ExtractionRuntime, IntentClassifier};

// Re-export pipeline components
pub use pipeline::{
    // Matching
    cosine_similarity, CandidateScore, Classification, MatchScore,
    // Field processing
    NormalizationKind, Normalizer, Validation, Validator,
};

// Re-export stores
pub use stores::{LlmCache, MemoryStore};

// Re-export testing utilities
pub use testing::{MockEmbedder, MockLlm, MockNer};
