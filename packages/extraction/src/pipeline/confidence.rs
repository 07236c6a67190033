//! Confidence scoring from validation outcome and key coverage.

use crate::pipeline::validate::Validation;
use crate::types::result::Values;

/// Score when the contract declares no output keys.
pub const NO_KEYS_CONFIDENCE: f32 = 0.5;

/// Fraction of expected keys present with a non-empty value.
pub fn coverage(values: &Values, expected_keys: &[String]) -> f32 {
    if expected_keys.is_empty() {
        return 0.0;
    }
    let extracted = expected_keys
        .iter()
        .filter(|k| values.get(*k).is_some_and(|v| !v.trim().is_empty()))
        .count();
    extracted as f32 / expected_keys.len() as f32
}

/// Map validation + coverage to a confidence in `[0, 1]`.
pub fn score(values: &Values, validation: &Validation, expected_keys: &[String]) -> f32 {
    if expected_keys.is_empty() {
        return NO_KEYS_CONFIDENCE;
    }
    if !validation.is_valid() {
        return 0.0;
    }

    let coverage = coverage(values, expected_keys);
    if coverage >= 1.0 {
        0.95
    } else if coverage >= 0.5 {
        0.7
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn values(pairs: &[(&str, &str)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_full_coverage() {
        let expected = keys(&["day", "month"]);
        let v = values(&[("day", "1"), ("month", "2")]);
        assert_eq!(score(&v, &Validation::default(), &expected), 0.95);
    }

    #[test]
    fn test_half_coverage() {
        let expected = keys(&["day", "month"]);
        let v = values(&[("day", "1")]);
        assert_eq!(score(&v, &Validation::default(), &expected), 0.7);
    }

    #[test]
    fn test_low_coverage() {
        let expected = keys(&["a", "b", "c"]);
        let v = values(&[("a", "1")]);
        assert_eq!(score(&v, &Validation::default(), &expected), 0.5);
    }

    #[test]
    fn test_invalid_is_zero() {
        let expected = keys(&["day"]);
        let v = values(&[("day", "40")]);
        let validation = Validation {
            errors: vec![FieldError::RangeViolation {
                kind: "day",
                value: "40".into(),
                min: 1,
                max: 31,
            }],
        };
        assert_eq!(score(&v, &validation, &expected), 0.0);
    }

    #[test]
    fn test_no_expected_keys() {
        let validation = Validation {
            errors: vec![FieldError::InvalidNumber {
                label: "x".into(),
                value: "y".into(),
            }],
        };
        assert_eq!(score(&Values::new(), &validation, &[]), 0.5);
    }

    #[test]
    fn test_unexpected_keys_do_not_count() {
        let expected = keys(&["day", "month"]);
        let v = values(&[("day", "1"), ("weekday", "mon")]);
        assert_eq!(coverage(&v, &expected), 0.5);
    }
}
