//! External collaborator traits.
//!
//! The runtime consumes three black-box services:
//! - Embedding: text to a fixed-dimension vector
//! - NER: text to labelled spans
//! - LLM: prompt to completion text
//!
//! Implementations wrap specific providers (OpenAI, a local model, ...).
//! Errors are reported as [`EngineError`] so the runtime can treat them as a
//! soft "no match".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Text embedding service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for text.
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch operation).
    async fn embed_batch(&self, texts: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        // Default implementation calls embed sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Named-entity recognition service.
#[async_trait]
pub trait NerProvider: Send + Sync {
    async fn recognize(&self, text: &str) -> EngineResult<Vec<NerEntity>>;
}

/// Text completion service.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt. The runtime expects JSON back.
    async fn complete(&self, prompt: &str) -> EngineResult<String>;
}

/// A labelled span returned by a NER provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerEntity {
    pub span: String,
    pub label: String,

    /// Byte offset of the span, when the provider reports it
    #[serde(default)]
    pub start: Option<usize>,
}

impl NerEntity {
    pub fn new(span: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            span: span.into(),
            label: label.into(),
            start: None,
        }
    }

    pub fn at(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }
}
