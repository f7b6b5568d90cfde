//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Defines the value held by one column of one grouped result row.
//! CONTEXT: Dimension values identify groups in the pivot hierarchy; measure
//! values are the numbers aggregated upstream. Null is a real group value that
//! sorts first and is never dropped.

use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Label shown for a null dimension value.
pub const EMPTY_LABEL: &str = "(empty)";

/// A single value from a grouped result row.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl DimensionValue {
    pub fn text(s: impl Into<String>) -> Self {
        DimensionValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DimensionValue::Null)
    }

    /// Returns the numeric value, if any. Measures are read through this.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DimensionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the display value used for header labels.
    pub fn display_value(&self) -> String {
        match self {
            DimensionValue::Null => EMPTY_LABEL.to_string(),
            DimensionValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            DimensionValue::Text(s) => s.clone(),
            DimensionValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        }
    }

    /// Sort rank of the variant: Null < Number < Text < Boolean.
    fn rank(&self) -> u8 {
        match self {
            DimensionValue::Null => 0,
            DimensionValue::Number(_) => 1,
            DimensionValue::Text(_) => 2,
            DimensionValue::Boolean(_) => 3,
        }
    }
}

impl Default for DimensionValue {
    fn default() -> Self {
        DimensionValue::Null
    }
}

// Integral numbers serialize as JSON integers so persisted paths read `[1162]`
// rather than `[1162.0]`.
impl Serialize for DimensionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DimensionValue::Null => serializer.serialize_unit(),
            DimensionValue::Boolean(b) => serializer.serialize_bool(*b),
            DimensionValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            DimensionValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

// NaN values are treated as equal to each other so values can key hash maps.
impl PartialEq for DimensionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DimensionValue::Null, DimensionValue::Null) => true,
            (DimensionValue::Boolean(a), DimensionValue::Boolean(b)) => a == b,
            (DimensionValue::Number(a), DimensionValue::Number(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (DimensionValue::Text(a), DimensionValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DimensionValue {}

impl Hash for DimensionValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            DimensionValue::Null => {}
            DimensionValue::Boolean(b) => b.hash(state),
            DimensionValue::Number(n) => {
                if n.is_nan() {
                    u64::MAX.hash(state);
                } else if *n == 0.0 {
                    // -0.0 == 0.0
                    0u64.hash(state);
                } else {
                    n.to_bits().hash(state);
                }
            }
            DimensionValue::Text(s) => s.hash(state),
        }
    }
}

impl PartialOrd for DimensionValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DimensionValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DimensionValue::Number(a), DimensionValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
            }
            (DimensionValue::Text(a), DimensionValue::Text(b)) => a.cmp(b),
            (DimensionValue::Boolean(a), DimensionValue::Boolean(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for DimensionValue {
    fn from(value: &str) -> Self {
        DimensionValue::Text(value.to_string())
    }
}

impl From<String> for DimensionValue {
    fn from(value: String) -> Self {
        DimensionValue::Text(value)
    }
}

impl From<f64> for DimensionValue {
    fn from(value: f64) -> Self {
        DimensionValue::Number(value)
    }
}

impl From<i64> for DimensionValue {
    fn from(value: i64) -> Self {
        DimensionValue::Number(value as f64)
    }
}

impl From<bool> for DimensionValue {
    fn from(value: bool) -> Self {
        DimensionValue::Boolean(value)
    }
}

impl<T: Into<DimensionValue>> From<Option<T>> for DimensionValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DimensionValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_first() {
        let mut values = vec![
            DimensionValue::text("Widget"),
            DimensionValue::Null,
            DimensionValue::Number(3.0),
        ];
        values.sort();
        assert_eq!(values[0], DimensionValue::Null);
        assert_eq!(values[1], DimensionValue::Number(3.0));
    }

    #[test]
    fn integral_numbers_serialize_as_integers() {
        let json = serde_json::to_string(&vec![
            DimensionValue::Number(1162.0),
            DimensionValue::Number(2.5),
            DimensionValue::Null,
        ])
        .unwrap();
        assert_eq!(json, "[1162,2.5,null]");
    }

    #[test]
    fn deserializes_untagged() {
        let values: Vec<DimensionValue> =
            serde_json::from_str(r#"["Affiliate", 34, null, true]"#).unwrap();
        assert_eq!(values[0], DimensionValue::text("Affiliate"));
        assert_eq!(values[1], DimensionValue::Number(34.0));
        assert!(values[2].is_null());
        assert_eq!(values[3], DimensionValue::Boolean(true));
    }

    #[test]
    fn display_values() {
        assert_eq!(DimensionValue::Null.display_value(), "(empty)");
        assert_eq!(DimensionValue::Number(1162.0).display_value(), "1162");
        assert_eq!(DimensionValue::Number(2.5).display_value(), "2.5");
    }
}
