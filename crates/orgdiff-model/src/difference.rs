//! Difference records emitted by the comparison engine.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::value::FieldValue;

/// Marker reported for the side of a pair that has no record at all.
pub const MISSING_MARKER: &str = "MISSING";

/// Classification of a single field disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifferenceKind {
    /// The record exists in one source only.
    RecordMissing,
    /// One side is null or empty, the other is not.
    NullValueDifference,
    /// Both sides hold different non-null values.
    ValueDifference,
}

impl DifferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecordMissing => "RECORD_MISSING",
            Self::NullValueDifference => "NULL_VALUE_DIFFERENCE",
            Self::ValueDifference => "VALUE_DIFFERENCE",
        }
    }
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side's value in a difference.
#[derive(Debug, Clone, PartialEq)]
pub enum SideValue {
    /// The source has no record with this key.
    Missing,
    Present(FieldValue),
}

impl SideValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Null or empty, but not missing.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Missing => false,
            Self::Present(value) => value.is_blank(),
        }
    }

    /// Text used by tabular exports: `MISSING`, empty for null, else the value.
    pub fn display_text(&self) -> String {
        match self {
            Self::Missing => MISSING_MARKER.to_string(),
            Self::Present(value) => value.to_string(),
        }
    }
}

impl Serialize for SideValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_str(MISSING_MARKER),
            Self::Present(value) => value.serialize(serializer),
        }
    }
}

/// A source name with its value for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceValue {
    pub source: String,
    pub value: SideValue,
}

/// Atomic unit of disagreement between two sources for one field of one record.
///
/// The pair is stored in canonical order (`left.source < right.source`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferenceRecord {
    pub object_type: String,
    pub key_field: String,
    pub key_value: String,
    pub field: String,
    pub kind: DifferenceKind,
    pub left: SourceValue,
    pub right: SourceValue,
}

impl DifferenceRecord {
    /// `"{object_type}.{field}"`.
    pub fn qualified_field(&self) -> String {
        format!("{}.{}", self.object_type, self.field)
    }

    /// Value reported for `source`, if it is one side of this pair.
    pub fn value_for(&self, source: &str) -> Option<&SideValue> {
        if self.left.source == source {
            Some(&self.left.value)
        } else if self.right.source == source {
            Some(&self.right.value)
        } else {
            None
        }
    }

    /// `(left, right)` source names.
    pub fn pair(&self) -> (&str, &str) {
        (&self.left.source, &self.right.source)
    }

    /// Sort key giving the engine's deterministic output order.
    pub fn sort_key(&self) -> (&str, &str, &str, &str, &str) {
        (
            &self.object_type,
            &self.key_value,
            &self.field,
            &self.left.source,
            &self.right.source,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(left: SideValue, right: SideValue) -> DifferenceRecord {
        DifferenceRecord {
            object_type: "Account".into(),
            key_field: "Id".into(),
            key_value: "1".into(),
            field: "Name".into(),
            kind: DifferenceKind::ValueDifference,
            left: SourceValue {
                source: "a".into(),
                value: left,
            },
            right: SourceValue {
                source: "b".into(),
                value: right,
            },
        }
    }

    #[test]
    fn missing_serializes_as_marker() {
        let diff = sample(
            SideValue::Present(FieldValue::text("Acme")),
            SideValue::Missing,
        );
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["right"]["value"], "MISSING");
        assert_eq!(json["left"]["value"], "Acme");
        assert_eq!(json["kind"], "VALUE_DIFFERENCE");
    }

    #[test]
    fn value_for_and_qualified_field() {
        let diff = sample(
            SideValue::Present(FieldValue::Null),
            SideValue::Present(FieldValue::Int(3)),
        );
        assert_eq!(diff.qualified_field(), "Account.Name");
        assert_eq!(
            diff.value_for("b"),
            Some(&SideValue::Present(FieldValue::Int(3)))
        );
        assert!(diff.value_for("c").is_none());
        assert!(diff.left.value.is_blank());
    }
}
