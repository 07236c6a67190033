//! Request, engine outcome and extraction result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::types::engine::EngineType;

/// Key -> captured value.
pub type Values = BTreeMap<String, String>;

/// Incoming extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub text: String,
}

impl ExtractionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Raw values captured by one engine, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCapture {
    pub values: Values,
    pub matched: bool,
}

impl RawCapture {
    /// A capture that matched with the given values.
    pub fn matched(values: Values) -> Self {
        Self {
            values,
            matched: true,
        }
    }

    /// Whether this capture carries anything to normalize.
    pub fn has_values(&self) -> bool {
        self.matched && !self.values.is_empty()
    }
}

/// What one engine invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    Matched(RawCapture),
    NoMatch,
    Error(EngineError),
}

impl EngineOutcome {
    /// Build an outcome from captured values; empty means no match.
    pub fn from_values(values: Values) -> Self {
        if values.is_empty() {
            EngineOutcome::NoMatch
        } else {
            EngineOutcome::Matched(RawCapture::matched(values))
        }
    }
}

/// Final result of an extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub values: Values,
    pub has_match: bool,
    pub errors: Vec<String>,
    pub source: Option<EngineType>,
    pub confidence: f32,
}

impl ExtractionResult {
    /// Successful extraction from `source`.
    pub fn success(values: Values, source: EngineType, confidence: f32) -> Self {
        Self {
            values,
            has_match: true,
            errors: Vec::new(),
            source: Some(source),
            confidence,
        }
    }

    /// Every engine failed.
    pub fn exhausted(errors: Vec<String>) -> Self {
        Self {
            values: Values::new(),
            has_match: false,
            errors,
            source: None,
            confidence: 0.0,
        }
    }
}
