//! LLM engine: contract-derived prompt, JSON response, short-TTL cache.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::engines::regex::value_key;
use crate::error::{EngineError, EngineResult};
use crate::pipeline::prompts::format_extract_prompt;
use crate::stores::LlmCache;
use crate::traits::engine::Engine;
use crate::traits::provider::LlmProvider;
use crate::types::contract::{OutputFormat, SemanticContract, VALUE_KEY};
use crate::types::engine::{EngineType, LlmSettings};
use crate::types::result::{EngineOutcome, Values};

/// Strip markdown code fences from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Render a JSON scalar as a captured value. Null, empty strings and
/// nested structures yield nothing.
fn scalar(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!rendered.is_empty()).then_some(rendered)
}

/// Parse an LLM response into values shaped by the contract's output format.
pub fn parse_response(response: &str, contract: &SemanticContract) -> EngineResult<Values> {
    let json: Value = serde_json::from_str(strip_code_blocks(response))
        .map_err(|e| EngineError::ParseFailure(e.to_string()))?;

    let mut values = Values::new();

    match contract.output_canonical.format {
        OutputFormat::Object => {
            let Value::Object(object) = json else {
                return Err(EngineError::ParseFailure(
                    "expected a JSON object".to_string(),
                ));
            };
            for key in contract.expected_keys() {
                if let Some(value) = object.get(key).and_then(scalar) {
                    values.insert(key.clone(), value);
                }
            }
        }
        OutputFormat::Value => {
            let key = value_key(contract).unwrap_or_else(|| VALUE_KEY.to_string());
            let value = match &json {
                Value::Object(object) => object
                    .get(&key)
                    .or_else(|| object.get(VALUE_KEY))
                    .or_else(|| match object.len() {
                        1 => object.values().next(),
                        _ => None,
                    })
                    .and_then(scalar),
                Value::Array(_) => {
                    return Err(EngineError::ParseFailure(
                        "expected a JSON object or scalar".to_string(),
                    ));
                }
                other => scalar(other),
            };
            if let Some(value) = value {
                values.insert(key, value);
            }
        }
    }

    Ok(values)
}

/// Engine backed by an external LLM.
pub struct LlmEngine {
    provider: Arc<dyn LlmProvider>,
    cache: Arc<LlmCache>,
    contract: SemanticContract,
    contract_id: String,
    prompt_template: Option<String>,
}

impl LlmEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        cache: Arc<LlmCache>,
        contract: &SemanticContract,
        settings: &LlmSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            contract_id: contract.identifier(),
            contract: contract.clone(),
            prompt_template: settings.prompt_template.clone(),
        }
    }

    fn outcome(&self, response: &str) -> EngineOutcome {
        match parse_response(response, &self.contract) {
            Ok(values) => EngineOutcome::from_values(values),
            Err(e) => EngineOutcome::Error(e),
        }
    }
}

#[async_trait]
impl Engine for LlmEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Llm
    }

    async fn apply(&self, text: &str) -> EngineOutcome {
        if let Some(cached) = self.cache.get(&self.contract_id, text) {
            debug!(contract = %self.contract_id, "LLM cache hit");
            return self.outcome(&cached);
        }

        let prompt = format_extract_prompt(self.prompt_template.as_deref(), &self.contract, text);
        let response = match self.provider.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => return EngineOutcome::Error(e),
        };

        let outcome = self.outcome(&response);
        // unparseable responses are not worth replaying
        if !matches!(outcome, EngineOutcome::Error(_)) {
            self.cache.put(&self.contract_id, text, response);
        }
        outcome
    }
}
