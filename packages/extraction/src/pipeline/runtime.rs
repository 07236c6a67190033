//! The extraction runtime - main entry point of the library.
//!
//! Escalation: engines are tried in policy order and the first one whose
//! values validate wins. Later engines are never invoked in sequential mode.
//! When every engine fails, the caller gets the union of what each engine
//! reported.

use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::engines::Providers;
use crate::error::{ConfigError, ConfigResult, EngineError, Result};
use crate::pipeline::classify::IntentClassifier;
use crate::pipeline::matcher::Classification;
use crate::pipeline::plan::{ExtractionPlan, PlannedEngine, Verdict};
use crate::stores::{LlmCache, MemoryStore};
use crate::traits::provider::{EmbeddingProvider, LlmProvider, NerProvider};
use crate::traits::store::EmbeddingStore;
use crate::types::config::{EscalationMode, RuntimeConfig};
use crate::types::embedding::IntentDefinition;
use crate::types::engine::EngineType;
use crate::types::result::{EngineOutcome, ExtractionRequest, ExtractionResult};
use crate::types::template::ExtractionTemplate;

/// Contract-driven extraction over pluggable engines.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = ExtractionRuntime::new()
///     .with_llm(Arc::new(llm))
///     .with_embedder(Arc::new(embedder));
///
/// let plan = runtime.load(&template)?;
/// let result = runtime.extract(&plan, "born 15/04/2020").await;
/// assert!(result.has_match);
/// ```
pub struct ExtractionRuntime {
    providers: Providers,
    config: RuntimeConfig,
}

impl Default for ExtractionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionRuntime {
    /// Create a runtime with no external providers, an in-memory embedding
    /// store and default configuration.
    pub fn new() -> Self {
        let config = RuntimeConfig::default();
        Self {
            providers: Providers {
                llm: None,
                ner: None,
                embedder: None,
                store: Arc::new(MemoryStore::new()),
                llm_cache: Arc::new(LlmCache::new(config.llm_cache_ttl())),
            },
            config,
        }
    }

    /// Replace the configuration. The LLM cache is recreated with the new TTL.
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.providers.llm_cache = Arc::new(LlmCache::new(config.llm_cache_ttl()));
        self.config = config;
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.providers.llm = Some(llm);
        self
    }

    pub fn with_ner(mut self, ner: Arc<dyn NerProvider>) -> Self {
        self.providers.ner = Some(ner);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.providers.embedder = Some(embedder);
        self
    }

    /// Use a shared embedding store instead of a private in-memory one.
    pub fn with_store(mut self, store: Arc<dyn EmbeddingStore>) -> Self {
        self.providers.store = store;
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn EmbeddingStore> {
        &self.providers.store
    }

    pub fn llm_cache(&self) -> &Arc<LlmCache> {
        &self.providers.llm_cache
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Validate a template and build its engines.
    pub fn load(&self, template: &ExtractionTemplate) -> ConfigResult<ExtractionPlan> {
        ExtractionPlan::load(template, &self.providers, &self.config)
    }

    /// Run escalation for one utterance.
    pub async fn extract(&self, plan: &ExtractionPlan, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let entity = &plan.contract().entity.entity_type;

        let result = match self.config.mode {
            EscalationMode::Sequential => self.extract_sequential(plan, text).await,
            EscalationMode::Concurrent => self.extract_concurrent(plan, text).await,
        };

        info!(
            entity = %entity,
            has_match = result.has_match,
            source = result.source.map(|s| s.as_str()),
            confidence = result.confidence,
            errors = result.errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extraction complete"
        );
        result
    }

    /// Load a template and extract in one call.
    pub async fn extract_template(
        &self,
        template: &ExtractionTemplate,
        text: &str,
    ) -> Result<ExtractionResult> {
        let plan = self.load(template)?;
        Ok(self.extract(&plan, text).await)
    }

    /// Serve an extraction request against a loaded plan.
    pub async fn handle(&self, plan: &ExtractionPlan, request: &ExtractionRequest) -> ExtractionResult {
        self.extract(plan, &request.text).await
    }

    async fn extract_sequential(&self, plan: &ExtractionPlan, text: &str) -> ExtractionResult {
        let mut errors = IndexSet::new();

        for planned in plan.engines() {
            let engine_type = planned.engine.engine_type();
            debug!(engine = %engine_type, "Trying engine");

            let outcome = run_engine(planned, text).await;
            match plan.evaluate(engine_type, outcome) {
                Verdict::Accepted(result) => return result,
                Verdict::Rejected(engine_errors) => errors.extend(engine_errors),
            }
        }

        ExtractionResult::exhausted(errors.into_iter().collect())
    }

    /// All engines start together; the winner is still chosen in try-list
    /// order, so the result matches sequential mode. Returns as soon as a
    /// valid result is in and every engine ahead of it has finished; the
    /// remaining engines are dropped.
    async fn extract_concurrent(&self, plan: &ExtractionPlan, text: &str) -> ExtractionResult {
        let engines = plan.engines();
        let mut pending: FuturesUnordered<_> = engines
            .iter()
            .enumerate()
            .map(|(index, planned)| async move { (index, run_engine(planned, text).await) })
            .collect();

        let mut verdicts: Vec<Option<Verdict>> = engines.iter().map(|_| None).collect();
        let mut next = 0;
        let mut errors = IndexSet::new();

        while let Some((index, outcome)) = pending.next().await {
            verdicts[index] = Some(plan.evaluate(engines[index].engine.engine_type(), outcome));

            // settle the try-list prefix that has finished
            while let Some(verdict) = verdicts.get_mut(next).and_then(Option::take) {
                match verdict {
                    Verdict::Accepted(result) => return result,
                    Verdict::Rejected(engine_errors) => errors.extend(engine_errors),
                }
                next += 1;
            }
        }

        ExtractionResult::exhausted(errors.into_iter().collect())
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Rank intents for the text by embedding similarity.
    pub async fn classify(
        &self,
        intents: Vec<IntentDefinition>,
        text: &str,
        top_n: usize,
    ) -> Result<Classification> {
        let embedder = self
            .providers
            .embedder
            .clone()
            .ok_or(ConfigError::MissingProvider {
                engine: EngineType::Embedding,
                provider: "embedding",
            })?;

        let classifier = IntentClassifier::new(embedder, self.providers.store.clone(), intents);
        Ok(classifier.classify(text, top_n).await?)
    }

    /// Drop all trained example vectors. Administrative operation.
    pub async fn clear_embeddings(&self) {
        self.providers.store.clear().await;
    }
}

/// Apply one engine within its time budget.
async fn run_engine(planned: &PlannedEngine, text: &str) -> EngineOutcome {
    match tokio::time::timeout(planned.timeout, planned.engine.apply(text)).await {
        Ok(outcome) => outcome,
        Err(_) => EngineOutcome::Error(EngineError::Timeout(planned.timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEmbedder;

    #[tokio::test]
    async fn test_classify_requires_embedder() {
        let runtime = ExtractionRuntime::new();
        let err = runtime.classify(Vec::new(), "hello", 3).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ExtractionError::Config(ConfigError::MissingProvider { .. })
        ));
    }

    #[tokio::test]
    async fn test_classify_through_runtime() {
        let embedder = MockEmbedder::new()
            .with_embedding("cancel it", vec![1.0, 0.0, 0.0])
            .with_embedding("what time is it", vec![0.0, 1.0, 0.0]);
        let runtime = ExtractionRuntime::new().with_embedder(Arc::new(embedder));

        let intents = vec![
            IntentDefinition::new("cancel", ["cancel it"], Vec::<String>::new()),
            IntentDefinition::new("time", ["what time is it"], Vec::<String>::new()),
        ];
        let result = runtime.classify(intents, "cancel it", 1).await.unwrap();

        assert_eq!(result.best.unwrap().id, "cancel");
        assert_eq!(result.top.len(), 1);

        runtime.clear_embeddings().await;
        assert!(runtime.store().get("intent:cancel").await.is_none());
    }

    #[test]
    fn test_with_config_resizes_cache_ttl() {
        let runtime = ExtractionRuntime::new()
            .with_config(RuntimeConfig::new().with_llm_cache_ttl_secs(5));
        assert_eq!(runtime.config().llm_cache_ttl().as_secs(), 5);
        assert!(runtime.llm_cache().is_empty());
    }
}
