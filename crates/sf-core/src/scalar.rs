//! Scalar values returned by single-value queries and expected by quality checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single warehouse value.
///
/// Deserializes untagged so configuration can write `expected_result: 0`,
/// `expected_result: "paid"` or `expected_result: null` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Value equality used by quality checks.
    ///
    /// Integers and floats compare numerically (`COUNT(*)` may come back as
    /// an integer while an aggregate over a decimal column comes back as a
    /// float). All other combinations require the same variant.
    pub fn matches(&self, other: &ScalarValue) -> bool {
        match (self, other) {
            (ScalarValue::Int(a), ScalarValue::Float(b))
            | (ScalarValue::Float(b), ScalarValue::Int(a)) => (*a as f64) == *b,
            (a, b) => a == b,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cross_variant_match() {
        assert!(ScalarValue::Int(2).matches(&ScalarValue::Float(2.0)));
        assert!(ScalarValue::Float(0.0).matches(&ScalarValue::Int(0)));
        assert!(!ScalarValue::Int(5).matches(&ScalarValue::Int(0)));
    }

    #[test]
    fn test_text_does_not_match_number() {
        assert!(!ScalarValue::Text("0".to_string()).matches(&ScalarValue::Int(0)));
    }

    #[test]
    fn test_null_matches_only_null() {
        assert!(ScalarValue::Null.matches(&ScalarValue::Null));
        assert!(!ScalarValue::Null.matches(&ScalarValue::Int(0)));
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: Vec<ScalarValue> = serde_yaml::from_str("[0, 2.5, paid, true, null]").unwrap();
        assert_eq!(
            values,
            vec![
                ScalarValue::Int(0),
                ScalarValue::Float(2.5),
                ScalarValue::Text("paid".to_string()),
                ScalarValue::Bool(true),
                ScalarValue::Null,
            ]
        );
    }
}
