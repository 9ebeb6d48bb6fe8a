//! Scalar field values and records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value held by one field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Build a text value, mapping blank strings to `Null`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Null
        } else {
            Self::Text(value)
        }
    }

    /// Returns true for `Null` and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns true for `Int` and `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Numeric view of the value. Text is parsed when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => parse_f64(s),
            Self::Null | Self::Bool(_) => None,
        }
    }

    /// Key representation of the value, `None` when blank.
    ///
    /// Key values are always compared as text so that `"1"` loaded from CSV
    /// and `1` loaded from parquet identify the same record.
    pub fn key_string(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string())
    }

    /// Stable encoding used for hashing. Blank values share one encoding.
    pub fn canonical(&self) -> String {
        match self {
            _ if self.is_blank() => "n".to_string(),
            Self::Bool(b) => format!("b:{b}"),
            Self::Int(v) => format!("i:{v}"),
            Self::Float(v) if v.is_nan() => "f:nan".to_string(),
            // -0.0 and 0.0 must hash identically
            Self::Float(v) if *v == 0.0 => "f:0".to_string(),
            Self::Float(v) => format!("f:{:016x}", v.to_bits()),
            Self::Text(s) => format!("s:{s}"),
            Self::Null => "n".to_string(),
        }
    }

    /// Convert a JSON value. Nested arrays and objects are kept as JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Self::Int(v),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_numeric(*v)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Formats a floating-point number without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// One record of an object type collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// 1-based position in the physical source collection.
    pub line_number: usize,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(line_number: usize) -> Self {
        Self {
            line_number,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly useful for fixtures.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Value of the key field, `None` when the field is absent or blank.
    pub fn key_value(&self, key_field: &str) -> Option<String> {
        self.fields.get(key_field).and_then(FieldValue::key_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_becomes_null() {
        assert_eq!(FieldValue::text("  "), FieldValue::Null);
        assert_eq!(FieldValue::text("x"), FieldValue::Text("x".into()));
    }

    #[test]
    fn key_string_normalizes_numbers() {
        assert_eq!(FieldValue::Int(7).key_string(), Some("7".to_string()));
        assert_eq!(FieldValue::Float(7.0).key_string(), Some("7".to_string()));
        assert_eq!(FieldValue::Float(7.25).key_string(), Some("7.25".to_string()));
        assert_eq!(FieldValue::Null.key_string(), None);
    }

    #[test]
    fn canonical_merges_blank_and_signed_zero() {
        assert_eq!(FieldValue::Null.canonical(), FieldValue::Text(String::new()).canonical());
        assert_eq!(FieldValue::Float(0.0).canonical(), FieldValue::Float(-0.0).canonical());
        assert_ne!(FieldValue::Int(1).canonical(), FieldValue::Text("1".into()).canonical());
    }

    #[test]
    fn from_json_flattens_nested_values() {
        let value: serde_json::Value =
            serde_json::json!({"a": 1, "b": 1.5, "c": null, "d": {"x": 1}, "e": ""});
        let map = value.as_object().unwrap();
        assert_eq!(FieldValue::from_json(&map["a"]), FieldValue::Int(1));
        assert_eq!(FieldValue::from_json(&map["b"]), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from_json(&map["c"]), FieldValue::Null);
        assert_eq!(
            FieldValue::from_json(&map["d"]),
            FieldValue::Text("{\"x\":1}".to_string())
        );
        assert_eq!(FieldValue::from_json(&map["e"]), FieldValue::Null);
    }

    #[test]
    fn format_numeric_keeps_integers() {
        assert_eq!(format_numeric(10.0), "10");
        assert_eq!(format_numeric(100.5), "100.5");
    }
}
