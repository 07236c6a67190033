//! Escalation policy - which engines to try, and in what order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::config::PriorityOrdering;
use crate::types::engine::EngineType;

/// Ordered escalation across engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationPolicy {
    pub engines: Vec<EscalationEntry>,

    /// Tried last if not already in the enabled list
    pub default_engine: EngineType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEntry {
    #[serde(rename = "type")]
    pub engine_type: EngineType,

    /// Lower runs first
    pub priority: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl EscalationPolicy {
    /// Create a policy with the given default engine and no entries.
    pub fn new(default_engine: EngineType) -> Self {
        Self {
            engines: Vec::new(),
            default_engine,
        }
    }

    /// Add an enabled engine.
    pub fn with_engine(mut self, engine_type: EngineType, priority: i32) -> Self {
        self.engines.push(EscalationEntry {
            engine_type,
            priority,
            enabled: true,
        });
        self
    }

    /// Add a disabled engine.
    pub fn with_disabled_engine(mut self, engine_type: EngineType, priority: i32) -> Self {
        self.engines.push(EscalationEntry {
            engine_type,
            priority,
            enabled: false,
        });
        self
    }

    /// Enabled engines by ascending priority (stable on ties), followed by
    /// the default engine when it is not already present.
    pub fn try_order(&self) -> Vec<EngineType> {
        let mut enabled: Vec<&EscalationEntry> = self.engines.iter().filter(|e| e.enabled).collect();
        // sort_by_key is stable: equal priorities keep list order
        enabled.sort_by_key(|e| e.priority);

        let mut order: Vec<EngineType> = Vec::with_capacity(enabled.len() + 1);
        for entry in enabled {
            if !order.contains(&entry.engine_type) {
                order.push(entry.engine_type);
            }
        }
        if !order.contains(&self.default_engine) {
            order.push(self.default_engine);
        }
        order
    }

    /// Check the policy against the set of configured engines.
    pub fn validate(
        &self,
        configured: &HashSet<EngineType>,
        ordering: PriorityOrdering,
    ) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.engines {
            if !configured.contains(&entry.engine_type) {
                return Err(ConfigError::UnknownEngine(entry.engine_type));
            }
            if !seen.insert(entry.engine_type) {
                return Err(ConfigError::DuplicateEngine(entry.engine_type));
            }
        }

        if !self.engines.iter().any(|e| e.enabled) {
            return Err(ConfigError::NoEnabledEngine);
        }

        if !configured.contains(&self.default_engine) {
            return Err(ConfigError::DefaultEngineNotConfigured(self.default_engine));
        }

        if ordering == PriorityOrdering::Strict {
            for pair in self.engines.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                if prev.priority == next.priority {
                    return Err(ConfigError::DuplicatePriority {
                        priority: next.priority,
                        first: prev.engine_type,
                        second: next.engine_type,
                    });
                }
                if prev.priority > next.priority {
                    return Err(ConfigError::NonAscendingPriority {
                        engine: next.engine_type,
                        priority: next.priority,
                        previous: prev.priority,
                    });
                }
            }
        }

        Ok(())
    }
}
