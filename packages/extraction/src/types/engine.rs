//! Engine configuration types.
//!
//! An [`EngineConfig`] carries an opaque JSON payload as authored; the loader
//! turns it into typed [`EngineSettings`] and rejects malformed payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// The extraction engine kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    Regex,
    RuleBased,
    Ner,
    Llm,
    Embedding,
}

impl EngineType {
    pub const ALL: [EngineType; 5] = [
        EngineType::Regex,
        EngineType::RuleBased,
        EngineType::Ner,
        EngineType::Llm,
        EngineType::Embedding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::Regex => "regex",
            EngineType::RuleBased => "rule_based",
            EngineType::Ner => "ner",
            EngineType::Llm => "llm",
            EngineType::Embedding => "embedding",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown engine type: {}", s))
    }
}

/// Engine configuration as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(rename = "type")]
    pub engine_type: EngineType,

    /// Engine-specific payload
    #[serde(default)]
    pub config: serde_json::Value,

    /// Per-engine timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Typed engine payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSettings {
    Regex(RegexSettings),
    RuleBased(RuleBasedSettings),
    Ner(NerSettings),
    Llm(LlmSettings),
    Embedding(EmbeddingSettings),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexSettings {
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedSettings {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// One `(condition, action)` pair of a rule-based engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: RuleCondition,
    pub action: RuleAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    /// Text contains any of the phrases (case-insensitive)
    Contains { any: Vec<String> },

    /// Text contains all of the phrases (case-insensitive)
    ContainsAll { all: Vec<String> },

    /// Regex finds a match somewhere in the text
    Matches { pattern: String },

    Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleAction {
    /// Emit constant values
    Emit { values: BTreeMap<String, String> },

    /// Emit the named groups of the first regex match
    Capture { pattern: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NerSettings {
    /// Entity label -> subTaskKey
    #[serde(default)]
    pub ner_entity_types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Prompt with `{text}`, `{entity}`, `{description}`, `{fields}`, `{keys}`
    /// placeholders. A contract-derived default is used when absent.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub positives: Vec<String>,

    #[serde(default)]
    pub negatives: Vec<String>,

    /// Minimum final score to count as a match
    #[serde(default = "default_embedding_threshold")]
    pub threshold: f32,

    /// Value emitted on match (defaults to the best-matching example)
    #[serde(default)]
    pub value: Option<String>,
}

fn default_embedding_threshold() -> f32 {
    0.7
}

impl EngineConfig {
    fn with_payload(engine_type: EngineType, payload: impl Serialize) -> Self {
        Self {
            engine_type,
            config: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
            timeout_ms: None,
        }
    }

    /// Regex engine with the given patterns.
    pub fn regex(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::with_payload(
            EngineType::Regex,
            RegexSettings {
                patterns: patterns.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Rule-based engine with ordered rules.
    pub fn rule_based(rules: Vec<Rule>) -> Self {
        Self::with_payload(EngineType::RuleBased, RuleBasedSettings { rules })
    }

    /// NER engine mapping entity labels to keys.
    pub fn ner(
        entity_types: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self::with_payload(
            EngineType::Ner,
            NerSettings {
                ner_entity_types: entity_types
                    .into_iter()
                    .map(|(label, key)| (label.into(), key.into()))
                    .collect(),
            },
        )
    }

    /// LLM engine, optionally with a custom prompt template.
    pub fn llm(prompt_template: Option<String>) -> Self {
        Self::with_payload(EngineType::Llm, LlmSettings { prompt_template })
    }

    /// Embedding engine over trained examples.
    pub fn embedding(
        positives: impl IntoIterator<Item = impl Into<String>>,
        negatives: impl IntoIterator<Item = impl Into<String>>,
        threshold: f32,
    ) -> Self {
        Self::with_payload(
            EngineType::Embedding,
            EmbeddingSettings {
                positives: positives.into_iter().map(Into::into).collect(),
                negatives: negatives.into_iter().map(Into::into).collect(),
                threshold,
                value: None,
            },
        )
    }

    /// Set the per-engine timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Parse the payload into typed settings.
    pub fn settings(&self) -> Result<EngineSettings, ConfigError> {
        let payload = if self.config.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            self.config.clone()
        };

        let invalid = |e: serde_json::Error| ConfigError::InvalidEngineConfig {
            engine: self.engine_type,
            reason: e.to_string(),
        };

        Ok(match self.engine_type {
            EngineType::Regex => {
                EngineSettings::Regex(serde_json::from_value(payload).map_err(invalid)?)
            }
            EngineType::RuleBased => {
                EngineSettings::RuleBased(serde_json::from_value(payload).map_err(invalid)?)
            }
            EngineType::Ner => EngineSettings::Ner(serde_json::from_value(payload).map_err(invalid)?),
            EngineType::Llm => EngineSettings::Llm(serde_json::from_value(payload).map_err(invalid)?),
            EngineType::Embedding => {
                EngineSettings::Embedding(serde_json::from_value(payload).map_err(invalid)?)
            }
        })
    }
}

impl Rule {
    pub fn new(condition: RuleCondition, action: RuleAction) -> Self {
        Self { condition, action }
    }
}

impl RuleCondition {
    pub fn contains(phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        RuleCondition::Contains {
            any: phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        RuleCondition::Matches {
            pattern: pattern.into(),
        }
    }
}

impl RuleAction {
    pub fn emit(values: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        RuleAction::Emit {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn capture(pattern: impl Into<String>) -> Self {
        RuleAction::Capture {
            pattern: pattern.into(),
        }
    }
}
