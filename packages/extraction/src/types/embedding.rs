//! Embedded example sets used by similarity matching.

use serde::{Deserialize, Serialize};

/// An example phrase together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedExample {
    pub text: String,
    pub vector: Vec<f32>,
}

impl EmbeddedExample {
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector,
        }
    }
}

/// Positive and negative examples for one contract or intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainedExamples {
    #[serde(default)]
    pub positives: Vec<EmbeddedExample>,

    #[serde(default)]
    pub negatives: Vec<EmbeddedExample>,
}

impl TrainedExamples {
    pub fn new(positives: Vec<EmbeddedExample>, negatives: Vec<EmbeddedExample>) -> Self {
        Self {
            positives,
            negatives,
        }
    }
}

/// Example phrases defining one intent for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub id: String,

    #[serde(default)]
    pub positives: Vec<String>,

    #[serde(default)]
    pub negatives: Vec<String>,
}

impl IntentDefinition {
    pub fn new(
        id: impl Into<String>,
        positives: impl IntoIterator<Item = impl Into<String>>,
        negatives: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            positives: positives.into_iter().map(Into::into).collect(),
            negatives: negatives.into_iter().map(Into::into).collect(),
        }
    }
}
