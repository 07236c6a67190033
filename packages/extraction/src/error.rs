//! Typed errors for the extraction runtime.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Three tiers:
//! - [`ConfigError`] is fatal and raised while loading a template, before any
//!   engine runs.
//! - [`EngineError`] is soft: the failing engine counts as "no match" and
//!   escalation continues.
//! - [`FieldError`] is data: collected by the validator and returned to the
//!   caller in `ExtractionResult::errors`.

use thiserror::Error;

use crate::types::engine::EngineType;

/// Errors surfaced by runtime entry points.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Template failed load-time validation
    #[error("invalid template: {0}")]
    Config(#[from] ConfigError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A provider call made outside of escalation failed (e.g. classification)
    #[error("provider error: {0}")]
    Provider(#[from] EngineError),
}

/// Load-time validation failures. These are never silently repaired.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("escalation policy references unknown engine: {0}")]
    UnknownEngine(EngineType),

    #[error("escalation policy has no enabled engine")]
    NoEnabledEngine,

    #[error("default engine {0} is not configured")]
    DefaultEngineNotConfigured(EngineType),

    #[error("duplicate priority {priority} for engines {first} and {second}")]
    DuplicatePriority {
        priority: i32,
        first: EngineType,
        second: EngineType,
    },

    #[error("priority {priority} of engine {engine} is lower than preceding priority {previous}")]
    NonAscendingPriority {
        engine: EngineType,
        priority: i32,
        previous: i32,
    },

    #[error("engine {0} listed more than once in escalation policy")]
    DuplicateEngine(EngineType),

    #[error("engine {0} configured more than once")]
    DuplicateEngineConfig(EngineType),

    #[error("composite entity must use object output format")]
    CompositeRequiresObject,

    #[error("outputCanonical.keys {keys:?} do not match subentity keys {subentities:?}")]
    KeysMismatch {
        keys: Vec<String>,
        subentities: Vec<String>,
    },

    #[error("duplicate subTaskKey: {0}")]
    DuplicateSubTaskKey(String),

    #[error("invalid config for {engine} engine: {reason}")]
    InvalidEngineConfig { engine: EngineType, reason: String },

    #[error("invalid regex for {engine} engine: {reason}")]
    InvalidPattern { engine: EngineType, reason: String },

    #[error("regex engine needs at least one pattern")]
    NoPatterns,

    #[error("no {provider} provider registered for {engine} engine")]
    MissingProvider {
        engine: EngineType,
        provider: &'static str,
    },

    #[error("invalid constraint for {field}: {reason}")]
    InvalidConstraint { field: String, reason: String },
}

/// Failures of a single engine invocation. Treated as "no match".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unparseable response: {0}")]
    ParseFailure(String),
}

/// Per-field validation failures. `Display` yields the exact message
/// returned to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("missing required field: {label} ({key})")]
    MissingRequiredField { label: String, key: String },

    #[error("invalid number for {label}: {value}")]
    InvalidNumber { label: String, value: String },

    #[error("invalid {kind}: {value} (must be {min}-{max})")]
    RangeViolation {
        kind: &'static str,
        value: String,
        min: i64,
        max: i64,
    },

    #[error("{label} out of range: {value} (must be {bound})")]
    ConstraintRange {
        label: String,
        value: String,
        bound: String,
    },

    #[error("{label} does not match required pattern: {value}")]
    ConstraintPattern { label: String, value: String },
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for template loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for provider calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
