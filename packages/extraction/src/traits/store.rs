//! Storage trait for trained example embeddings.
//!
//! Embedding the positive/negative example phrases of a contract or intent is
//! the expensive part of similarity matching, so the vectors are kept in an
//! injected store keyed by identifier. The store is created at process start
//! and only emptied through an explicit [`EmbeddingStore::clear`] call.

use async_trait::async_trait;

use crate::types::embedding::TrainedExamples;

/// Store for trained example vectors.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Get the trained examples for an identifier.
    async fn get(&self, id: &str) -> Option<TrainedExamples>;

    /// Store trained examples, replacing any previous entry.
    async fn put(&self, id: &str, examples: TrainedExamples);

    /// Drop every entry. Administrative operation.
    async fn clear(&self);
}
