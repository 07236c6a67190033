//! Normalizer - rewrites raw captures per field rule.
//!
//! Contracts carry normalization rules as short natural-language strings
//! ("year always 4 digits", "month as numeric"). They are resolved once, at
//! load time, into a [`NormalizationKind`]; the runtime then applies the
//! kind without looking at the rule text again. Normalization never fails:
//! a value it cannot interpret is passed through for the validator to judge.

use crate::types::contract::SemanticContract;
use crate::types::result::Values;

/// Two-digit years below this map to 20xx, the rest to 19xx.
pub const YEAR_PIVOT: i64 = 50;

const MONTHS_EN: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTHS_EN_SHORT: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const MONTHS_IT: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

const MONTHS_IT_SHORT: [&str; 12] = [
    "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
];

/// A resolved normalization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationKind {
    /// Two-digit years pivot around `pivot`
    YearPivot { pivot: i64 },

    /// Month names (English/Italian) or 1-12 to a month number
    MonthName,

    /// 1-31 to a day number
    DayNumeric,

    Identity,
}

impl NormalizationKind {
    /// Resolve rule text. The first matching rule wins; matching is by
    /// case-insensitive substring.
    pub fn resolve(rule: Option<&str>) -> Self {
        let Some(rule) = rule else {
            return NormalizationKind::Identity;
        };
        let rule = rule.to_lowercase();

        if rule.contains("year") && rule.contains("4 digits") {
            NormalizationKind::YearPivot { pivot: YEAR_PIVOT }
        } else if rule.contains("month") && rule.contains("numeric") {
            NormalizationKind::MonthName
        } else if rule.contains("day") && rule.contains("numeric") {
            NormalizationKind::DayNumeric
        } else {
            NormalizationKind::Identity
        }
    }

    /// Apply to one value.
    pub fn apply(&self, value: &str) -> String {
        let accepted = match self {
            NormalizationKind::YearPivot { pivot } => parse_int(value).map(|n| pivot_year(n, *pivot)),
            NormalizationKind::MonthName => normalize_month(value),
            NormalizationKind::DayNumeric => parse_int(value).filter(|n| (1..=31).contains(n)),
            NormalizationKind::Identity => None,
        };

        match accepted {
            Some(n) => n.to_string(),
            None => value.to_string(),
        }
    }
}

fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

fn pivot_year(n: i64, pivot: i64) -> i64 {
    if !(0..100).contains(&n) {
        return n;
    }
    if n < pivot {
        2000 + n
    } else {
        1900 + n
    }
}

/// Expand a two-digit year: `5 → 2005`, `61 → 1961`; others unchanged.
pub fn normalize_year(n: i64) -> i64 {
    pivot_year(n, YEAR_PIVOT)
}

/// Month name or number to 1-12.
pub fn normalize_month(value: &str) -> Option<i64> {
    let lower = value.trim().to_lowercase();

    for table in [&MONTHS_EN, &MONTHS_EN_SHORT, &MONTHS_IT, &MONTHS_IT_SHORT] {
        if let Some(idx) = table.iter().position(|m| *m == lower) {
            return Some(idx as i64 + 1);
        }
    }

    parse_int(&lower).filter(|n| (1..=12).contains(n))
}

/// Per-contract normalizer with rules resolved at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalizer {
    rules: Vec<(String, NormalizationKind)>,
}

impl Normalizer {
    /// Resolve the rules of every subentity that has one.
    pub fn for_contract(contract: &SemanticContract) -> Self {
        let rules = contract
            .subentities
            .iter()
            .filter_map(|s| {
                let kind = NormalizationKind::resolve(s.normalization.as_deref());
                (kind != NormalizationKind::Identity).then(|| (s.sub_task_key.clone(), kind))
            })
            .collect();
        Self { rules }
    }

    /// The resolved kind for a key.
    pub fn kind_for(&self, key: &str) -> NormalizationKind {
        self.rules
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, kind)| *kind)
            .unwrap_or(NormalizationKind::Identity)
    }

    /// Normalize raw values. Keys without a rule pass through.
    pub fn normalize(&self, raw: &Values) -> Values {
        raw.iter()
            .map(|(key, value)| (key.clone(), self.kind_for(key).apply(value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contract::Subentity;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year(5), 2005);
        assert_eq!(normalize_year(61), 1961);
        assert_eq!(normalize_year(49), 2049);
        assert_eq!(normalize_year(50), 1950);
        assert_eq!(normalize_year(1998), 1998);
    }

    #[test]
    fn test_normalize_month_names() {
        assert_eq!(normalize_month("December"), Some(12));
        assert_eq!(normalize_month("dic"), Some(12));
        assert_eq!(normalize_month("GENNAIO"), Some(1));
        assert_eq!(normalize_month("04"), Some(4));
        assert_eq!(normalize_month("13"), None);
        assert_eq!(normalize_month("smarch"), None);
    }

    #[test]
    fn test_month_invalid_passes_through() {
        let kind = NormalizationKind::MonthName;
        assert_eq!(kind.apply("13"), "13");
        assert_eq!(kind.apply("December"), "12");
    }

    #[test]
    fn test_resolve_rule_text() {
        assert_eq!(
            NormalizationKind::resolve(Some("Year always 4 digits")),
            NormalizationKind::YearPivot { pivot: 50 }
        );
        assert_eq!(
            NormalizationKind::resolve(Some("month as numeric 1-12")),
            NormalizationKind::MonthName
        );
        assert_eq!(
            NormalizationKind::resolve(Some("day numeric")),
            NormalizationKind::DayNumeric
        );
        assert_eq!(
            NormalizationKind::resolve(Some("uppercase please")),
            NormalizationKind::Identity
        );
        assert_eq!(NormalizationKind::resolve(None), NormalizationKind::Identity);
    }

    #[test]
    fn test_year_non_numeric_passes_through() {
        let kind = NormalizationKind::YearPivot { pivot: 50 };
        assert_eq!(kind.apply("last year"), "last year");
        assert_eq!(kind.apply("05"), "2005");
    }

    #[test]
    fn test_day_out_of_range_passes_through() {
        let kind = NormalizationKind::DayNumeric;
        assert_eq!(kind.apply("07"), "7");
        assert_eq!(kind.apply("32"), "32");
    }

    #[test]
    fn test_normalizer_for_contract() {
        let contract = SemanticContract::composite(
            "date",
            "Date",
            vec![
                Subentity::new("day", "Day").with_normalization("day numeric"),
                Subentity::new("month", "Month").with_normalization("month numeric"),
                Subentity::new("year", "Year").with_normalization("year 4 digits"),
                Subentity::new("note", "Note"),
            ],
        );
        let normalizer = Normalizer::for_contract(&contract);

        let raw: Values = [
            ("day", "03"),
            ("month", "aprile"),
            ("year", "88"),
            ("note", " as-is "),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let normalized = normalizer.normalize(&raw);
        assert_eq!(normalized["day"], "3");
        assert_eq!(normalized["month"], "4");
        assert_eq!(normalized["year"], "1988");
        assert_eq!(normalized["note"], " as-is ");
    }

    proptest! {
        #[test]
        fn prop_year_always_four_digits_for_two_digit_input(n in 0i64..100) {
            let year = normalize_year(n);
            prop_assert!((1950..=2049).contains(&year));
            prop_assert_eq!(year % 100, n);
        }

        #[test]
        fn prop_normalizer_never_drops_keys(value in ".*") {
            let raw: Values = [("year".to_string(), value.clone())].into_iter().collect();
            let contract = SemanticContract::composite(
                "date",
                "Date",
                vec![Subentity::new("year", "Year").with_normalization("year 4 digits")],
            );
            let normalized = Normalizer::for_contract(&contract).normalize(&raw);
            prop_assert!(normalized.contains_key("year"));
        }
    }
}
