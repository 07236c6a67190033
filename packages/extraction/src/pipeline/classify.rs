//! Intent classification over embedding-matched example sets.

use std::sync::Arc;
use tracing::debug;

use crate::error::EngineResult;
use crate::pipeline::matcher::{rank, train, Classification};
use crate::traits::{provider::EmbeddingProvider, store::EmbeddingStore};
use crate::types::embedding::{IntentDefinition, TrainedExamples};

/// Chooses among several intents by embedding similarity.
///
/// Example vectors are read from the injected store and trained on first
/// use; the store outlives the classifier.
pub struct IntentClassifier {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn EmbeddingStore>,
    intents: Vec<IntentDefinition>,
}

impl IntentClassifier {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn EmbeddingStore>,
        intents: Vec<IntentDefinition>,
    ) -> Self {
        Self {
            embedder,
            store,
            intents,
        }
    }

    pub fn intents(&self) -> &[IntentDefinition] {
        &self.intents
    }

    /// Store key for an intent's trained examples.
    pub fn store_key(intent_id: &str) -> String {
        format!("intent:{}", intent_id)
    }

    async fn trained(&self, intent: &IntentDefinition) -> EngineResult<TrainedExamples> {
        let key = Self::store_key(&intent.id);
        if let Some(examples) = self.store.get(&key).await {
            return Ok(examples);
        }

        debug!(intent = %intent.id, positives = intent.positives.len(), "Training intent examples");
        let examples = train(self.embedder.as_ref(), &intent.positives, &intent.negatives).await?;
        self.store.put(&key, examples.clone()).await;
        Ok(examples)
    }

    /// Rank intents for the text, keeping the `top_n` best.
    pub async fn classify(&self, text: &str, top_n: usize) -> EngineResult<Classification> {
        let query = self.embedder.embed(text).await?;

        let mut trained = Vec::with_capacity(self.intents.len());
        for intent in &self.intents {
            trained.push((intent.id.as_str(), self.trained(intent).await?));
        }

        let classification = rank(
            &query,
            trained.iter().map(|(id, examples)| (*id, examples)),
            top_n,
        );

        debug!(
            best = classification.best.as_ref().map(|c| c.id.as_str()),
            candidates = classification.top.len(),
            "Intent classification"
        );
        Ok(classification)
    }
}
