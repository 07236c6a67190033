use anyhow::{bail, Context, Result};
use contract_extraction::{EscalationMode, RuntimeConfig};
use dotenvy::dotenv;
use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub timeout_ms: u64,
    pub llm_cache_ttl_secs: u64,
    pub mode: EscalationMode,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            timeout_ms: env::var("EXTRACT_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .context("EXTRACT_TIMEOUT_MS must be a valid number")?,
            llm_cache_ttl_secs: env::var("EXTRACT_LLM_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("EXTRACT_LLM_CACHE_TTL_SECS must be a valid number")?,
            mode: parse_mode(&env::var("EXTRACT_MODE").unwrap_or_else(|_| "sequential".to_string()))?,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_model: env::var("OPENAI_MODEL").ok().filter(|m| !m.is_empty()),
        })
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::new()
            .with_default_timeout_ms(self.timeout_ms)
            .with_llm_cache_ttl_secs(self.llm_cache_ttl_secs)
            .with_mode(self.mode)
    }
}

fn parse_mode(value: &str) -> Result<EscalationMode> {
    match value.trim().to_lowercase().as_str() {
        "sequential" => Ok(EscalationMode::Sequential),
        "concurrent" => Ok(EscalationMode::Concurrent),
        other => bail!("EXTRACT_MODE must be 'sequential' or 'concurrent', got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Concurrent").unwrap(), EscalationMode::Concurrent);
        assert_eq!(parse_mode(" sequential ").unwrap(), EscalationMode::Sequential);
        assert!(parse_mode("parallel").is_err());
    }

    #[test]
    fn test_runtime_config() {
        let config = Config {
            timeout_ms: 2500,
            llm_cache_ttl_secs: 5,
            mode: EscalationMode::Concurrent,
            openai_api_key: None,
            openai_model: None,
        };
        let runtime = config.runtime_config();

        assert_eq!(runtime.default_timeout_ms, 2500);
        assert_eq!(runtime.llm_cache_ttl_secs, 5);
        assert_eq!(runtime.mode, EscalationMode::Concurrent);
    }
}
