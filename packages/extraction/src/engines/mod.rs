//! Engine implementations.
//!
//! - `RegexEngine` - longest match across patterns
//! - `RuleBasedEngine` - first holding rule
//! - `NerEngine` - external recognizer, labels mapped to keys
//! - `LlmEngine` - external LLM returning JSON
//! - `EmbeddingEngine` - similarity to example phrases

pub mod embedding;
pub mod llm;
pub mod ner;
pub mod regex;
pub mod rule_based;

pub use embedding::EmbeddingEngine;
pub use llm::LlmEngine;
pub use ner::NerEngine;
pub use regex::RegexEngine;
pub use rule_based::RuleBasedEngine;

use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::stores::LlmCache;
use crate::traits::engine::Engine;
use crate::traits::provider::{EmbeddingProvider, LlmProvider, NerProvider};
use crate::traits::store::EmbeddingStore;
use crate::types::contract::SemanticContract;
use crate::types::engine::{EngineConfig, EngineSettings};

/// External services and shared state engines are built from.
#[derive(Clone)]
pub struct Providers {
    pub llm: Option<Arc<dyn LlmProvider>>,
    pub ner: Option<Arc<dyn NerProvider>>,
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub store: Arc<dyn EmbeddingStore>,
    pub llm_cache: Arc<LlmCache>,
}

/// Build an engine from its configuration.
///
/// Patterns are compiled and providers resolved here, so a template that
/// loads never fails for configuration reasons at extraction time.
pub fn build(
    config: &EngineConfig,
    contract: &SemanticContract,
    providers: &Providers,
) -> ConfigResult<Box<dyn Engine>> {
    let engine_type = config.engine_type;
    let missing = |provider: &'static str| ConfigError::MissingProvider {
        engine: engine_type,
        provider,
    };

    let engine: Box<dyn Engine> = match config.settings()? {
        EngineSettings::Regex(settings) => {
            Box::new(RegexEngine::new(&settings.patterns, contract)?)
        }
        EngineSettings::RuleBased(settings) => {
            Box::new(RuleBasedEngine::new(&settings.rules, contract)?)
        }
        EngineSettings::Ner(settings) => {
            let provider = providers.ner.clone().ok_or_else(|| missing("NER"))?;
            Box::new(NerEngine::new(provider, &settings))
        }
        EngineSettings::Llm(settings) => {
            let provider = providers.llm.clone().ok_or_else(|| missing("LLM"))?;
            Box::new(LlmEngine::new(
                provider,
                providers.llm_cache.clone(),
                contract,
                &settings,
            ))
        }
        EngineSettings::Embedding(settings) => {
            let embedder = providers.embedder.clone().ok_or_else(|| missing("embedding"))?;
            Box::new(EmbeddingEngine::new(
                embedder,
                providers.store.clone(),
                contract,
                &settings,
            ))
        }
    };

    Ok(engine)
}
