//! Rule-based engine: ordered `(condition, action)` pairs, first hit wins.

use async_trait::async_trait;
use regex::Regex;

use crate::engines::regex::{compile_patterns, extract_groups, value_key};
use crate::error::ConfigResult;
use crate::traits::engine::Engine;
use crate::types::contract::SemanticContract;
use crate::types::engine::{EngineType, Rule, RuleAction, RuleCondition};
use crate::types::result::{EngineOutcome, Values};

enum Condition {
    Contains(Vec<String>),
    ContainsAll(Vec<String>),
    Matches(Regex),
    Always,
}

enum Action {
    Emit(Values),
    Capture(Regex),
}

struct CompiledRule {
    condition: Condition,
    action: Action,
}

fn lowercase_all(phrases: &[String]) -> Vec<String> {
    phrases.iter().map(|p| p.to_lowercase()).collect()
}

fn compile_one(pattern: &str) -> ConfigResult<Regex> {
    let mut compiled = compile_patterns(EngineType::RuleBased, &[pattern.to_string()])?;
    Ok(compiled.remove(0))
}

impl CompiledRule {
    fn compile(rule: &Rule) -> ConfigResult<Self> {
        let condition = match &rule.condition {
            RuleCondition::Contains { any } => Condition::Contains(lowercase_all(any)),
            RuleCondition::ContainsAll { all } => Condition::ContainsAll(lowercase_all(all)),
            RuleCondition::Matches { pattern } => Condition::Matches(compile_one(pattern)?),
            RuleCondition::Always => Condition::Always,
        };

        let action = match &rule.action {
            RuleAction::Emit { values } => Action::Emit(values.clone()),
            RuleAction::Capture { pattern } => Action::Capture(compile_one(pattern)?),
        };

        Ok(Self { condition, action })
    }

    fn holds(&self, text: &str, lower: &str) -> bool {
        match &self.condition {
            Condition::Contains(any) => any.iter().any(|p| lower.contains(p.as_str())),
            Condition::ContainsAll(all) => all.iter().all(|p| lower.contains(p.as_str())),
            Condition::Matches(re) => re.is_match(text),
            Condition::Always => true,
        }
    }
}

/// Deterministic rule evaluation.
pub struct RuleBasedEngine {
    rules: Vec<CompiledRule>,
    value_key: Option<String>,
}

impl RuleBasedEngine {
    pub fn new(rules: &[Rule], contract: &SemanticContract) -> ConfigResult<Self> {
        Ok(Self {
            rules: rules.iter().map(CompiledRule::compile).collect::<ConfigResult<_>>()?,
            value_key: value_key(contract),
        })
    }

    /// Values produced by the first rule whose condition holds.
    pub fn capture(&self, text: &str) -> Values {
        let lower = text.to_lowercase();

        let Some(rule) = self.rules.iter().find(|r| r.holds(text, &lower)) else {
            return Values::new();
        };

        match &rule.action {
            Action::Emit(values) => values
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(k, v)| (k.clone(), v.trim().to_string()))
                .collect(),
            Action::Capture(re) => re
                .captures(text)
                .map(|caps| extract_groups(re, &caps, self.value_key.as_deref()))
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Engine for RuleBasedEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::RuleBased
    }

    async fn apply(&self, text: &str) -> EngineOutcome {
        EngineOutcome::from_values(self.capture(text))
    }
}
