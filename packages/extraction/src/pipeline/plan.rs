//! Load-time validation and compilation of an extraction template.
//!
//! An [`ExtractionPlan`] is what the runtime executes: every invariant of the
//! template has been checked, patterns are compiled, providers are resolved,
//! normalization rules are resolved and the try-list is fixed. Nothing in a
//! plan can fail for configuration reasons once it exists.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

use crate::engines::{self, Providers};
use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::confidence;
use crate::pipeline::normalize::Normalizer;
use crate::pipeline::validate::Validator;
use crate::traits::engine::Engine;
use crate::types::config::RuntimeConfig;
use crate::types::contract::{OutputFormat, SemanticContract};
use crate::types::engine::EngineType;
use crate::types::result::{EngineOutcome, ExtractionResult, Values};
use crate::types::template::ExtractionTemplate;

/// One engine of the try-list with its call budget.
pub struct PlannedEngine {
    pub engine: Box<dyn Engine>,
    pub timeout: Duration,
}

/// Verdict on one engine's outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Valid values; escalation stops here
    Accepted(ExtractionResult),

    /// Errors this engine contributes to an exhausted result
    Rejected(Vec<String>),
}

/// A validated, ready-to-run template.
pub struct ExtractionPlan {
    contract: SemanticContract,
    normalizer: Normalizer,
    validator: Validator,
    engines: Vec<PlannedEngine>,
}

/// Check contract shape: composite entities need object output whose keys
/// are exactly the subentity keys, and subentity keys are unique.
pub fn check_contract(contract: &SemanticContract) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for sub in &contract.subentities {
        if !seen.insert(sub.sub_task_key.as_str()) {
            return Err(ConfigError::DuplicateSubTaskKey(sub.sub_task_key.clone()));
        }
    }

    if !contract.is_composite() {
        return Ok(());
    }

    if contract.output_canonical.format != OutputFormat::Object {
        return Err(ConfigError::CompositeRequiresObject);
    }

    let keys: BTreeSet<&str> = contract.expected_keys().iter().map(String::as_str).collect();
    if keys != seen.into_iter().collect::<BTreeSet<_>>()
        || keys.len() != contract.expected_keys().len()
    {
        return Err(ConfigError::KeysMismatch {
            keys: contract.expected_keys().to_vec(),
            subentities: contract
                .subentities
                .iter()
                .map(|s| s.sub_task_key.clone())
                .collect(),
        });
    }

    Ok(())
}

impl ExtractionPlan {
    /// Validate a template and build its engines.
    pub fn load(
        template: &ExtractionTemplate,
        providers: &Providers,
        config: &RuntimeConfig,
    ) -> ConfigResult<Self> {
        let contract = &template.contract;
        check_contract(contract)?;
        let validator = Validator::for_contract(contract)?;

        let mut configured = HashSet::new();
        for engine in &template.engines {
            if !configured.insert(engine.engine_type) {
                return Err(ConfigError::DuplicateEngineConfig(engine.engine_type));
            }
        }

        template
            .escalation
            .validate(&configured, config.priority_ordering)?;

        // every configured engine is built, so a broken one fails the load
        // even when the policy does not reach it
        let mut built = Vec::with_capacity(template.engines.len());
        for engine_config in &template.engines {
            let engine = engines::build(engine_config, contract, providers)?;
            let timeout = config.timeout_for(engine_config.engine_type, engine_config.timeout_ms);
            built.push(Some(PlannedEngine { engine, timeout }));
        }

        let mut engines = Vec::new();
        for engine_type in template.escalation.try_order() {
            let slot = template
                .engines
                .iter()
                .position(|c| c.engine_type == engine_type)
                .and_then(|idx| built[idx].take());
            match slot {
                Some(planned) => engines.push(planned),
                // unreachable after policy validation
                None => return Err(ConfigError::UnknownEngine(engine_type)),
            }
        }

        let unused = built.iter().filter(|b| b.is_some()).count();
        if unused > 0 {
            warn!(
                entity = %contract.entity.entity_type,
                unused,
                "Configured engines not reachable through escalation policy"
            );
        }

        let plan = Self {
            contract: contract.clone(),
            normalizer: Normalizer::for_contract(contract),
            validator,
            engines,
        };

        debug!(
            entity = %plan.contract.entity.entity_type,
            try_order = ?plan.try_order(),
            "Template loaded"
        );
        Ok(plan)
    }

    pub fn contract(&self) -> &SemanticContract {
        &self.contract
    }

    pub fn engines(&self) -> &[PlannedEngine] {
        &self.engines
    }

    /// Engine types in the order they are tried.
    pub fn try_order(&self) -> Vec<EngineType> {
        self.engines.iter().map(|p| p.engine.engine_type()).collect()
    }

    /// Keep only the keys the contract expects.
    fn expected_only(&self, values: Values) -> Values {
        let keys = self.contract.expected_keys();
        if keys.is_empty() {
            return values;
        }
        values.into_iter().filter(|(k, _)| keys.contains(k)).collect()
    }

    /// Normalize, validate and score one engine's outcome.
    pub fn evaluate(&self, engine_type: EngineType, outcome: EngineOutcome) -> Verdict {
        let raw = match outcome {
            EngineOutcome::Matched(capture) if capture.has_values() => {
                self.expected_only(capture.values)
            }
            EngineOutcome::Matched(_) | EngineOutcome::NoMatch => Values::new(),
            EngineOutcome::Error(e) => {
                warn!(engine = %engine_type, error = %e, "Engine failed");
                return Verdict::Rejected(vec![format!("{} engine failed: {}", engine_type, e)]);
            }
        };

        if raw.is_empty() {
            debug!(engine = %engine_type, "No match");
            return Verdict::Rejected(self.validator.validate(&Values::new()).messages());
        }

        let values = self.normalizer.normalize(&raw);
        let validation = self.validator.validate(&values);
        if !validation.is_valid() {
            debug!(
                engine = %engine_type,
                errors = validation.errors.len(),
                "Captured values failed validation"
            );
            return Verdict::Rejected(validation.messages());
        }

        let confidence = confidence::score(&values, &validation, self.contract.expected_keys());
        Verdict::Accepted(ExtractionResult::success(values, engine_type, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{LlmCache, MemoryStore};
    use crate::testing::MockLlm;
    use crate::types::contract::Subentity;
    use crate::types::engine::EngineConfig;
    use crate::types::policy::EscalationPolicy;
    use crate::types::result::RawCapture;
    use std::sync::Arc;

    const DATE_PATTERN: &str = r"(?<day>\d{1,2})[/-](?<month>\d{1,2})[/-](?<year>\d{2,4})";

    fn providers() -> Providers {
        Providers {
            llm: Some(Arc::new(MockLlm::new())),
            ner: None,
            embedder: None,
            store: Arc::new(MemoryStore::new()),
            llm_cache: Arc::new(LlmCache::new(Duration::from_secs(60))),
        }
    }

    fn dob() -> SemanticContract {
        SemanticContract::composite(
            "date",
            "Date of birth",
            vec![
                Subentity::new("day", "Day").number(),
                Subentity::new("month", "Month").number().with_normalization("month numeric"),
                Subentity::new("year", "Year").number().with_normalization("year 4 digits"),
            ],
        )
    }

    fn template() -> ExtractionTemplate {
        ExtractionTemplate::new(
            dob(),
            vec![EngineConfig::regex([DATE_PATTERN]), EngineConfig::llm(None)],
            EscalationPolicy::new(EngineType::Llm).with_engine(EngineType::Regex, 1),
        )
    }

    fn load(template: &ExtractionTemplate) -> ConfigResult<ExtractionPlan> {
        ExtractionPlan::load(template, &providers(), &RuntimeConfig::default())
    }

    fn captured(pairs: &[(&str, &str)]) -> EngineOutcome {
        EngineOutcome::Matched(RawCapture::matched(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_try_order_appends_default() {
        let plan = load(&template()).unwrap();
        assert_eq!(plan.try_order(), vec![EngineType::Regex, EngineType::Llm]);
    }

    #[test]
    fn test_per_engine_timeout_override() {
        let mut template = template();
        template.engines[1] = EngineConfig::llm(None).with_timeout_ms(250);

        let plan = load(&template).unwrap();
        assert_eq!(plan.engines()[1].timeout, Duration::from_millis(250));
        assert_eq!(
            plan.engines()[0].timeout,
            RuntimeConfig::default().timeout_for(EngineType::Regex, None)
        );
    }

    #[test]
    fn test_evaluate_normalizes_and_scores() {
        let plan = load(&template()).unwrap();

        let verdict = plan.evaluate(
            EngineType::Regex,
            captured(&[("day", "3"), ("month", "dic"), ("year", "85"), ("junk", "x")]),
        );
        let Verdict::Accepted(result) = verdict else {
            panic!("expected acceptance");
        };
        assert_eq!(result.values["month"], "12");
        assert_eq!(result.values["year"], "1985");
        assert!(!result.values.contains_key("junk"));
        assert_eq!(result.source, Some(EngineType::Regex));
        assert!((result.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_no_match_reports_missing_fields() {
        let plan = load(&template()).unwrap();

        let Verdict::Rejected(errors) = plan.evaluate(EngineType::Regex, EngineOutcome::NoMatch)
        else {
            panic!("expected rejection");
        };
        assert_eq!(
            errors,
            vec![
                "missing required field: Day (day)",
                "missing required field: Month (month)",
                "missing required field: Year (year)",
            ]
        );
    }

    #[test]
    fn test_evaluate_engine_failure() {
        let plan = load(&template()).unwrap();
        let verdict = plan.evaluate(
            EngineType::Llm,
            EngineOutcome::Error(crate::error::EngineError::Timeout(100)),
        );
        assert_eq!(
            verdict,
            Verdict::Rejected(vec!["llm engine failed: timed out after 100ms".to_string()])
        );
    }

    #[test]
    fn test_contract_shape_errors() {
        let mut contract = dob();
        contract.output_canonical.format = OutputFormat::Value;
        assert_eq!(check_contract(&contract), Err(ConfigError::CompositeRequiresObject));

        let mut contract = dob();
        contract.output_canonical.keys.pop();
        assert!(matches!(
            check_contract(&contract),
            Err(ConfigError::KeysMismatch { .. })
        ));

        let mut contract = dob();
        contract.subentities.push(Subentity::new("day", "Day again"));
        assert_eq!(
            check_contract(&contract),
            Err(ConfigError::DuplicateSubTaskKey("day".to_string()))
        );
    }

    #[test]
    fn test_duplicate_engine_config() {
        let mut template = template();
        template.engines.push(EngineConfig::regex([r"\d+"]));
        assert!(matches!(
            load(&template),
            Err(ConfigError::DuplicateEngineConfig(EngineType::Regex))
        ));
    }

    #[test]
    fn test_missing_provider() {
        let template = ExtractionTemplate::new(
            dob(),
            vec![EngineConfig::ner([("DATE", "day")])],
            EscalationPolicy::new(EngineType::Ner).with_engine(EngineType::Ner, 1),
        );
        assert_eq!(
            load(&template).err(),
            Some(ConfigError::MissingProvider {
                engine: EngineType::Ner,
                provider: "NER",
            })
        );
    }
}
