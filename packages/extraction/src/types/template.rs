//! The bundle handed over by the authoring system.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{contract::SemanticContract, engine::EngineConfig, policy::EscalationPolicy};

/// Contract, engine configurations and escalation policy for one entity.
///
/// Treated as immutable input; the runtime never writes back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionTemplate {
    pub contract: SemanticContract,

    #[serde(default)]
    pub engines: Vec<EngineConfig>,

    pub escalation: EscalationPolicy,
}

impl ExtractionTemplate {
    pub fn new(
        contract: SemanticContract,
        engines: Vec<EngineConfig>,
        escalation: EscalationPolicy,
    ) -> Self {
        Self {
            contract,
            engines,
            escalation,
        }
    }

    /// Parse a template from JSON. Only the shape is checked here; the
    /// invariants are checked when the template is loaded.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
