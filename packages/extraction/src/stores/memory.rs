//! In-memory embedding store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::traits::store::EmbeddingStore;
use crate::types::embedding::TrainedExamples;

/// In-memory storage for trained example vectors.
///
/// One instance is meant to live for the whole process and be shared
/// (behind an `Arc`) by the runtime and the intent classifier. Data is lost
/// on restart, which is fine: vectors are re-embedded on first use.
#[derive(Default)]
pub struct MemoryStore {
    examples: RwLock<HashMap<String, TrainedExamples>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored example sets.
    pub async fn len(&self) -> usize {
        self.examples.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.examples.read().await.is_empty()
    }
}

#[async_trait]
impl EmbeddingStore for MemoryStore {
    async fn get(&self, id: &str) -> Option<TrainedExamples> {
        self.examples.read().await.get(id).cloned()
    }

    async fn put(&self, id: &str, examples: TrainedExamples) {
        self.examples.write().await.insert(id.to_string(), examples);
    }

    async fn clear(&self) {
        self.examples.write().await.clear();
    }
}
