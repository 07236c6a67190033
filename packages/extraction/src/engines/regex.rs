//! Regex engine.
//!
//! All configured patterns run against the text. Among every match of every
//! pattern the longest span wins; ties go to the earliest pattern, then the
//! earliest position. Named groups of the winning match become the values.

use async_trait::async_trait;
use regex::{Captures, Regex};

use crate::error::{ConfigError, ConfigResult};
use crate::traits::engine::Engine;
use crate::types::contract::{OutputFormat, SemanticContract, VALUE_KEY};
use crate::types::engine::EngineType;
use crate::types::result::{EngineOutcome, Values};

/// Compile patterns, reporting which engine they belong to.
pub(crate) fn compile_patterns(engine: EngineType, patterns: &[String]) -> ConfigResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                engine,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Where unnamed captures go: `Some(key)` for value-format contracts.
pub(crate) fn value_key(contract: &SemanticContract) -> Option<String> {
    match contract.output_canonical.format {
        OutputFormat::Value => Some(
            contract
                .expected_keys()
                .first()
                .cloned()
                .unwrap_or_else(|| VALUE_KEY.to_string()),
        ),
        OutputFormat::Object => None,
    }
}

/// Pull values out of one match.
///
/// Named groups are trimmed and kept when non-empty. For value-format
/// contracts with no named value, the first participating unnamed group
/// (or the whole match) becomes the value.
pub(crate) fn extract_groups(re: &Regex, caps: &Captures<'_>, value_key: Option<&str>) -> Values {
    let mut values = Values::new();

    for name in re.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            let value = m.as_str().trim();
            if !value.is_empty() {
                values.insert(name.to_string(), value.to_string());
            }
        }
    }

    if let Some(key) = value_key {
        if values.is_empty() {
            let unnamed = re
                .capture_names()
                .enumerate()
                .skip(1)
                .filter(|(_, name)| name.is_none())
                .find_map(|(idx, _)| caps.get(idx))
                .or_else(|| caps.get(0));

            if let Some(m) = unnamed {
                let value = m.as_str().trim();
                if !value.is_empty() {
                    values.insert(key.to_string(), value.to_string());
                }
            }
        }
    }

    values
}

/// Pattern-matching engine.
pub struct RegexEngine {
    patterns: Vec<Regex>,
    value_key: Option<String>,
}

impl RegexEngine {
    pub fn new(patterns: &[String], contract: &SemanticContract) -> ConfigResult<Self> {
        if patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        Ok(Self {
            patterns: compile_patterns(EngineType::Regex, patterns)?,
            value_key: value_key(contract),
        })
    }

    /// Values of the longest match across all patterns.
    pub fn capture(&self, text: &str) -> Values {
        let mut best: Option<(usize, &Regex, Captures<'_>)> = None;

        for re in &self.patterns {
            for caps in re.captures_iter(text) {
                let len = caps.get(0).map_or(0, |m| m.len());
                // strict > keeps the earlier pattern / position on ties
                if best.as_ref().map_or(true, |(best_len, _, _)| len > *best_len) {
                    best = Some((len, re, caps));
                }
            }
        }

        match best {
            Some((_, re, caps)) => extract_groups(re, &caps, self.value_key.as_deref()),
            None => Values::new(),
        }
    }
}

#[async_trait]
impl Engine for RegexEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Regex
    }

    async fn apply(&self, text: &str) -> EngineOutcome {
        EngineOutcome::from_values(self.capture(text))
    }
}
