//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction runtime
//! without making real model or network calls. Every mock records its calls
//! so tests can assert which collaborators escalation actually reached.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::traits::provider::{EmbeddingProvider, LlmProvider, NerEntity, NerProvider};

/// A mock LLM for testing.
///
/// Responses are chosen by the first registered needle found in the prompt,
/// falling back to a default response.
#[derive(Default)]
pub struct MockLlm {
    /// (needle, response) in registration order
    responses: Arc<RwLock<Vec<(String, String)>>>,

    default_response: Arc<RwLock<Option<String>>>,

    /// Fail every call with this error
    failure: Arc<RwLock<Option<EngineError>>>,

    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockLlmCall>>>,
}

/// Record of a call made to the mock LLM.
#[derive(Debug, Clone, PartialEq)]
pub enum MockLlmCall {
    Complete { prompt: String },
}

impl MockLlm {
    /// Create a new mock LLM that answers `{}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `response` when the prompt contains `needle`.
    pub fn with_response(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((needle.into(), response.into()));
        self
    }

    /// Answer `response` when nothing else matches.
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *self.default_response.write().unwrap() = Some(response.into());
        self
    }

    /// Fail every call.
    pub fn failing(self, error: EngineError) -> Self {
        *self.failure.write().unwrap() = Some(error);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockLlmCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, prompt: &str) -> EngineResult<String> {
        self.calls.write().unwrap().push(MockLlmCall::Complete {
            prompt: prompt.to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.read().unwrap().clone() {
            return Err(error);
        }

        let matched = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        Ok(matched
            .or_else(|| self.default_response.read().unwrap().clone())
            .unwrap_or_else(|| "{}".to_string()))
    }
}

/// A mock NER provider for testing.
#[derive(Default)]
pub struct MockNer {
    /// Predefined entities by exact input text
    entities: Arc<RwLock<HashMap<String, Vec<NerEntity>>>>,

    failure: Arc<RwLock<Option<EngineError>>>,

    delay: Option<Duration>,

    calls: Arc<RwLock<Vec<MockNerCall>>>,
}

/// Record of a call made to the mock NER provider.
#[derive(Debug, Clone, PartialEq)]
pub enum MockNerCall {
    Recognize { text: String },
}

impl MockNer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `entities` for `text`.
    pub fn with_entities(self, text: impl Into<String>, entities: Vec<NerEntity>) -> Self {
        self.entities.write().unwrap().insert(text.into(), entities);
        self
    }

    /// Fail every call.
    pub fn failing(self, error: EngineError) -> Self {
        *self.failure.write().unwrap() = Some(error);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<MockNerCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl NerProvider for MockNer {
    async fn recognize(&self, text: &str) -> EngineResult<Vec<NerEntity>> {
        self.calls.write().unwrap().push(MockNerCall::Recognize {
            text: text.to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.read().unwrap().clone() {
            return Err(error);
        }

        Ok(self
            .entities
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_default())
    }
}

/// A mock embedding provider for testing.
///
/// Returns predefined vectors by text, or a deterministic hash-derived
/// vector for unknown text.
pub struct MockEmbedder {
    embeddings: Arc<RwLock<HashMap<String, Vec<f32>>>>,

    /// Dimension of generated vectors
    embedding_dim: usize,

    calls: Arc<RwLock<Vec<MockEmbedderCall>>>,
}

/// Record of a call made to the mock embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEmbedderCall {
    Embed { text: String },
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            embeddings: Arc::new(RwLock::new(HashMap::new())),
            embedding_dim: 3,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the dimension of generated vectors.
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Add a predefined embedding for text.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings
            .write()
            .unwrap()
            .insert(text.into(), embedding);
        self
    }

    pub fn calls(&self) -> Vec<MockEmbedderCall> {
        self.calls.read().unwrap().clone()
    }

    /// Generate a deterministic embedding based on text.
    fn generate_deterministic_embedding(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        (0..self.embedding_dim)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                // Normalize to [-1, 1] range
                (byte / 127.5) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>> {
        self.calls.write().unwrap().push(MockEmbedderCall::Embed {
            text: text.to_string(),
        });

        Ok(self
            .embeddings
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.generate_deterministic_embedding(text)))
    }
}
