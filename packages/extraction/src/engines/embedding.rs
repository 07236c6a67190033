//! Embedding engine: similarity of the input to the contract's examples.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use crate::engines::regex::value_key;
use crate::error::EngineResult;
use crate::pipeline::matcher::{score, train};
use crate::traits::engine::Engine;
use crate::traits::provider::EmbeddingProvider;
use crate::traits::store::EmbeddingStore;
use crate::types::contract::{SemanticContract, VALUE_KEY};
use crate::types::embedding::TrainedExamples;
use crate::types::engine::{EmbeddingSettings, EngineType};
use crate::types::result::{EngineOutcome, Values};

/// Matches when the input is close enough to a positive example and not
/// too close to a negative one.
pub struct EmbeddingEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn EmbeddingStore>,
    store_key: String,
    settings: EmbeddingSettings,
    output_key: String,
}

impl EmbeddingEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn EmbeddingStore>,
        contract: &SemanticContract,
        settings: &EmbeddingSettings,
    ) -> Self {
        let output_key = value_key(contract)
            .or_else(|| contract.expected_keys().first().cloned())
            .unwrap_or_else(|| VALUE_KEY.to_string());

        Self {
            embedder,
            store,
            store_key: Self::store_key(&contract.identifier(), settings),
            settings: settings.clone(),
            output_key,
        }
    }

    /// Store key for a contract's trained examples, qualified by a SHA-256
    /// of the example lists.
    pub fn store_key(contract_id: &str, settings: &EmbeddingSettings) -> String {
        let mut hasher = Sha256::new();
        for (tag, examples) in [(b'+', &settings.positives), (b'-', &settings.negatives)] {
            for example in examples {
                hasher.update([tag]);
                hasher.update(example.as_bytes());
                hasher.update([0x1f]);
            }
        }
        let digest = format!("{:x}", hasher.finalize());
        format!("contract:{}:{}", contract_id, &digest[..16])
    }

    async fn trained(&self) -> EngineResult<TrainedExamples> {
        if let Some(examples) = self.store.get(&self.store_key).await {
            return Ok(examples);
        }

        debug!(
            key = %self.store_key,
            positives = self.settings.positives.len(),
            negatives = self.settings.negatives.len(),
            "Training contract examples"
        );
        let examples = train(
            self.embedder.as_ref(),
            &self.settings.positives,
            &self.settings.negatives,
        )
        .await?;
        self.store.put(&self.store_key, examples.clone()).await;
        Ok(examples)
    }

    async fn capture(&self, text: &str) -> EngineResult<Values> {
        let examples = self.trained().await?;
        let query = self.embedder.embed(text).await?;
        let result = score(&query, &examples);

        debug!(
            best = result.best_match_score,
            penalty = result.penalty,
            final_score = result.final_score,
            threshold = self.settings.threshold,
            "Embedding match"
        );

        let mut values = Values::new();
        if result.final_score >= self.settings.threshold {
            let value = self.settings.value.clone().or(result.best_match_text);
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                values.insert(self.output_key.clone(), value.trim().to_string());
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl Engine for EmbeddingEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Embedding
    }

    async fn apply(&self, text: &str) -> EngineOutcome {
        match self.capture(text).await {
            Ok(values) => EngineOutcome::from_values(values),
            Err(e) => EngineOutcome::Error(e),
        }
    }
}
