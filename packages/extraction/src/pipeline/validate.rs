//! Validator - checks normalized values against the contract.

use regex::Regex;

use crate::error::{ConfigError, ConfigResult, FieldError};
use crate::types::contract::{SemanticContract, Subentity};
use crate::types::result::Values;

/// Semantic range checks, triggered by a case-insensitive substring of the
/// subTaskKey.
const RANGE_CHECKS: [(&str, i64, i64); 3] = [("day", 1, 31), ("month", 1, 12), ("year", 1900, 2100)];

/// Outcome of validating one set of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<FieldError>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages as returned to callers.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone)]
struct CompiledConstraint {
    min: Option<i64>,
    max: Option<i64>,
    pattern: Option<Regex>,
}

/// Per-contract validator with constraints compiled at construction.
#[derive(Debug, Clone)]
pub struct Validator {
    fields: Vec<Subentity>,
    constraints: Vec<(String, CompiledConstraint)>,
}

impl Validator {
    /// Build a validator, rejecting malformed constraints.
    pub fn for_contract(contract: &SemanticContract) -> ConfigResult<Self> {
        let mut constraints = Vec::with_capacity(contract.constraints.len());

        for (field, constraint) in &contract.constraints {
            if contract.is_composite() && contract.subentity(field).is_none() {
                return Err(ConfigError::InvalidConstraint {
                    field: field.clone(),
                    reason: "no subentity with this key".to_string(),
                });
            }
            if let (Some(min), Some(max)) = (constraint.min, constraint.max) {
                if min > max {
                    return Err(ConfigError::InvalidConstraint {
                        field: field.clone(),
                        reason: format!("min {} exceeds max {}", min, max),
                    });
                }
            }
            let pattern = constraint
                .pattern
                .as_deref()
                .map(|p| Regex::new(&format!("^(?:{})$", p)))
                .transpose()
                .map_err(|e| ConfigError::InvalidConstraint {
                    field: field.clone(),
                    reason: e.to_string(),
                })?;

            constraints.push((
                field.clone(),
                CompiledConstraint {
                    min: constraint.min,
                    max: constraint.max,
                    pattern,
                },
            ));
        }

        Ok(Self {
            fields: contract.subentities.clone(),
            constraints,
        })
    }

    /// Validate every subentity. All errors are collected.
    pub fn validate(&self, values: &Values) -> Validation {
        let mut errors = Vec::new();

        for field in &self.fields {
            let key = &field.sub_task_key;
            let value = values.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

            let Some(value) = value else {
                if !field.optional {
                    errors.push(FieldError::MissingRequiredField {
                        label: field.label.clone(),
                        key: key.clone(),
                    });
                }
                continue;
            };

            if field.is_number() && value.parse::<i64>().is_err() {
                errors.push(FieldError::InvalidNumber {
                    label: field.label.clone(),
                    value: value.to_string(),
                });
            }

            let key_lower = key.to_lowercase();
            for (kind, min, max) in RANGE_CHECKS {
                if !key_lower.contains(kind) {
                    continue;
                }
                let in_range = value
                    .parse::<i64>()
                    .map(|n| (min..=max).contains(&n))
                    .unwrap_or(false);
                if !in_range {
                    errors.push(FieldError::RangeViolation {
                        kind,
                        value: value.to_string(),
                        min,
                        max,
                    });
                }
            }

            if let Some((_, constraint)) = self.constraints.iter().find(|(f, _)| f == key) {
                check_constraint(field, value, constraint, &mut errors);
            }
        }

        Validation { errors }
    }
}

fn check_constraint(
    field: &Subentity,
    value: &str,
    constraint: &CompiledConstraint,
    errors: &mut Vec<FieldError>,
) {
    let bound = match (constraint.min, constraint.max) {
        (Some(min), Some(max)) => Some(format!("{}-{}", min, max)),
        (Some(min), None) => Some(format!(">= {}", min)),
        (None, Some(max)) => Some(format!("<= {}", max)),
        (None, None) => None,
    };

    if let Some(bound) = bound {
        let in_bounds = value
            .parse::<i64>()
            .map(|n| {
                constraint.min.map_or(true, |min| n >= min)
                    && constraint.max.map_or(true, |max| n <= max)
            })
            .unwrap_or(false);

        if !in_bounds {
            errors.push(FieldError::ConstraintRange {
                label: field.label.clone(),
                value: value.to_string(),
                bound,
            });
        }
    }

    if let Some(pattern) = &constraint.pattern {
        if !pattern.is_match(value) {
            errors.push(FieldError::ConstraintPattern {
                label: field.label.clone(),
                value: value.to_string(),
            });
        }
    }
}
