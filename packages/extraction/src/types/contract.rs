//! Semantic contract types - the declarative description of what to extract.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Declarative description of an entity to extract.
///
/// A contract with no subentities describes a simple entity (one value);
/// otherwise each subentity is one field of a composite entity and
/// `output_canonical.keys` lists the subentity keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticContract {
    /// Stable identifier assigned by the authoring system.
    ///
    /// Used as part of cache keys. When absent, [`SemanticContract::identifier`]
    /// falls back to a content fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// What the entity is
    pub entity: EntityInfo,

    /// Shape of the canonical output
    pub output_canonical: OutputCanonical,

    /// Fields of a composite entity (empty for simple entities)
    #[serde(default)]
    pub subentities: Vec<Subentity>,

    /// Optional per-field constraints, keyed by subTaskKey
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, FieldConstraint>,
}

/// Entity metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    #[serde(rename = "type")]
    pub entity_type: String,

    pub label: String,

    #[serde(default)]
    pub description: String,
}

/// Output shape: a single value or a keyed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputCanonical {
    pub format: OutputFormat,

    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Value,
    Object,
}

/// One field of a composite entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subentity {
    /// Output key, unique within the contract
    pub sub_task_key: String,

    /// Human-readable label (used in error messages)
    pub label: String,

    /// Free-text meaning, fed to LLM prompts
    #[serde(default)]
    pub meaning: String,

    /// Field type ("number", "string", ...)
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,

    #[serde(default)]
    pub optional: bool,

    /// Natural-language normalization rule, e.g. "year always 4 digits"
    #[serde(default)]
    pub normalization: Option<String>,
}

fn default_field_type() -> String {
    "string".to_string()
}

/// Extra per-field checks applied by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraint {
    /// Inclusive integer lower bound
    #[serde(default)]
    pub min: Option<i64>,

    /// Inclusive integer upper bound
    #[serde(default)]
    pub max: Option<i64>,

    /// Regex the whole value must match
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Key used for simple (value-format) contracts.
pub const VALUE_KEY: &str = "value";

impl SemanticContract {
    /// Create a simple (single value) contract.
    pub fn simple(entity_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            entity: EntityInfo {
                entity_type: entity_type.into(),
                label: label.into(),
                description: String::new(),
            },
            output_canonical: OutputCanonical {
                format: OutputFormat::Value,
                keys: vec![VALUE_KEY.to_string()],
            },
            subentities: Vec::new(),
            constraints: BTreeMap::new(),
        }
    }

    /// Create a composite contract whose output keys are the subentity keys.
    pub fn composite(
        entity_type: impl Into<String>,
        label: impl Into<String>,
        subentities: Vec<Subentity>,
    ) -> Self {
        let keys = subentities.iter().map(|s| s.sub_task_key.clone()).collect();
        Self {
            output_canonical: OutputCanonical {
                format: OutputFormat::Object,
                keys,
            },
            subentities,
            ..Self::simple(entity_type, label)
        }
    }

    /// Set the contract identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the entity description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.entity.description = description.into();
        self
    }

    /// Add a per-field constraint.
    pub fn with_constraint(mut self, key: impl Into<String>, constraint: FieldConstraint) -> Self {
        self.constraints.insert(key.into(), constraint);
        self
    }

    /// Whether this contract describes a composite entity.
    pub fn is_composite(&self) -> bool {
        !self.subentities.is_empty()
    }

    /// Expected output keys.
    pub fn expected_keys(&self) -> &[String] {
        &self.output_canonical.keys
    }

    /// Look up a subentity by key.
    pub fn subentity(&self, key: &str) -> Option<&Subentity> {
        self.subentities.iter().find(|s| s.sub_task_key == key)
    }

    /// Identifier for caching: the explicit id, or a SHA-256 fingerprint of
    /// the serialized contract.
    pub fn identifier(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => {
                let bytes = serde_json::to_vec(self).unwrap_or_default();
                let mut hasher = Sha256::new();
                hasher.update(&bytes);
                format!("{:x}", hasher.finalize())
            }
        }
    }
}

impl Subentity {
    /// Create a required string field.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            sub_task_key: key.into(),
            label: label.into(),
            meaning: String::new(),
            field_type: default_field_type(),
            optional: false,
            normalization: None,
        }
    }

    /// Mark as a numeric field.
    pub fn number(mut self) -> Self {
        self.field_type = "number".to_string();
        self
    }

    /// Mark as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the meaning text.
    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = meaning.into();
        self
    }

    /// Set the normalization rule text.
    pub fn with_normalization(mut self, rule: impl Into<String>) -> Self {
        self.normalization = Some(rule.into());
        self
    }

    pub fn is_number(&self) -> bool {
        self.field_type.eq_ignore_ascii_case("number")
    }
}
