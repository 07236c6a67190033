//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::engine::EngineType;

/// Configuration for the extraction runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Timeout applied to every engine call without a more specific one.
    ///
    /// Default: 10 000 ms.
    pub default_timeout_ms: u64,

    /// Per engine-type timeouts (overridden by `EngineConfig::timeout_ms`).
    #[serde(default)]
    pub engine_timeouts_ms: BTreeMap<EngineType, u64>,

    /// How long a cached LLM response stays valid.
    ///
    /// Default: 60 s.
    pub llm_cache_ttl_secs: u64,

    /// Sequential (default) or concurrent escalation.
    pub mode: EscalationMode,

    /// How duplicate priorities are treated at load time.
    pub priority_ordering: PriorityOrdering,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            engine_timeouts_ms: BTreeMap::new(),
            llm_cache_ttl_secs: 60,
            mode: EscalationMode::Sequential,
            priority_ordering: PriorityOrdering::Stable,
        }
    }
}

impl RuntimeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default engine timeout.
    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Set the timeout for one engine type.
    pub fn with_engine_timeout_ms(mut self, engine: EngineType, timeout_ms: u64) -> Self {
        self.engine_timeouts_ms.insert(engine, timeout_ms);
        self
    }

    /// Set the LLM cache TTL.
    pub fn with_llm_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.llm_cache_ttl_secs = secs;
        self
    }

    /// Set the escalation mode.
    pub fn with_mode(mut self, mode: EscalationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set priority ordering.
    pub fn with_priority_ordering(mut self, ordering: PriorityOrdering) -> Self {
        self.priority_ordering = ordering;
        self
    }

    /// Resolve the timeout for an engine: explicit override, then
    /// per-type setting, then the default.
    pub fn timeout_for(&self, engine: EngineType, override_ms: Option<u64>) -> Duration {
        let ms = override_ms
            .or_else(|| self.engine_timeouts_ms.get(&engine).copied())
            .unwrap_or(self.default_timeout_ms);
        Duration::from_millis(ms)
    }

    pub fn llm_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.llm_cache_ttl_secs)
    }
}

/// How the runtime walks the try-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMode {
    /// One engine at a time; stops at the first valid result.
    #[default]
    Sequential,

    /// All engines at once; the first valid result in try order wins.
    Concurrent,
}

/// Whether equal priorities are allowed in an escalation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrdering {
    /// Ascending with gaps; ties keep list order.
    #[default]
    Stable,

    /// Listed priorities must be strictly ascending.
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_resolution_order() {
        let config = RuntimeConfig::new()
            .with_default_timeout_ms(1_000)
            .with_engine_timeout_ms(EngineType::Llm, 5_000);

        assert_eq!(
            config.timeout_for(EngineType::Regex, None),
            Duration::from_millis(1_000)
        );
        assert_eq!(
            config.timeout_for(EngineType::Llm, None),
            Duration::from_millis(5_000)
        );
        assert_eq!(
            config.timeout_for(EngineType::Llm, Some(200)),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.llm_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.mode, EscalationMode::Sequential);
        assert_eq!(config.priority_ordering, PriorityOrdering::Stable);
    }
}
