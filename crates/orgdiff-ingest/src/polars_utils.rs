//! Conversions between records and Polars frames.
//!
//! Parquet collections are read into a `DataFrame` and turned into records;
//! the JSONL cache goes the other way.

use std::collections::BTreeSet;

use orgdiff_model::{FieldValue, Record};
use polars::prelude::*;

/// Converts a Polars AnyValue to a field value.
pub fn any_to_field_value(value: AnyValue<'_>) -> FieldValue {
    match value {
        AnyValue::Null => FieldValue::Null,
        AnyValue::Boolean(b) => FieldValue::Bool(b),
        AnyValue::Int8(v) => FieldValue::Int(i64::from(v)),
        AnyValue::Int16(v) => FieldValue::Int(i64::from(v)),
        AnyValue::Int32(v) => FieldValue::Int(i64::from(v)),
        AnyValue::Int64(v) => FieldValue::Int(v),
        AnyValue::UInt8(v) => FieldValue::Int(i64::from(v)),
        AnyValue::UInt16(v) => FieldValue::Int(i64::from(v)),
        AnyValue::UInt32(v) => FieldValue::Int(i64::from(v)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => FieldValue::Int(v),
            Err(_) => FieldValue::Float(v as f64),
        },
        AnyValue::Float32(v) => FieldValue::Float(f64::from(v)),
        AnyValue::Float64(v) => FieldValue::Float(v),
        AnyValue::String(s) => FieldValue::text(s),
        AnyValue::StringOwned(s) => FieldValue::text(s.as_str()),
        other => FieldValue::text(other.to_string()),
    }
}

/// Turns every row of `df` into a record with one field per column.
///
/// Row `i` gets line number `i + 1`.
pub fn dataframe_to_records(df: &DataFrame) -> Vec<Record> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|idx| {
            let mut record = Record::new(idx + 1);
            for column in columns {
                let value = any_to_field_value(column.get(idx).unwrap_or(AnyValue::Null));
                record.fields.insert(column.name().to_string(), value);
            }
            record
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Int,
    Float,
    Text,
}

fn column_kind<'a>(values: impl Iterator<Item = &'a FieldValue>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for value in values {
        let this = match value {
            FieldValue::Null => continue,
            FieldValue::Bool(_) => ColumnKind::Bool,
            FieldValue::Int(_) => ColumnKind::Int,
            FieldValue::Float(_) => ColumnKind::Float,
            FieldValue::Text(_) => return ColumnKind::Text,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int | ColumnKind::Float), ColumnKind::Int | ColumnKind::Float) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

/// Builds a frame with one column per field name seen in `records`.
///
/// Column types follow the values: all-bool, all-int, numeric (float) or
/// text. Mixed columns are stored as display text.
pub fn records_to_dataframe(records: &[Record]) -> PolarsResult<DataFrame> {
    let names: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.fields.keys().map(String::as_str))
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for name in names {
        let cells = move || records.iter().map(move |record| record.get(name));
        let kind = column_kind(cells().flatten());
        let series = match kind {
            ColumnKind::Bool => {
                let values: Vec<Option<bool>> = cells()
                    .map(|v| match v {
                        Some(FieldValue::Bool(b)) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values)
            }
            ColumnKind::Int => {
                let values: Vec<Option<i64>> = cells()
                    .map(|v| match v {
                        Some(FieldValue::Int(i)) => Some(*i),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values)
            }
            ColumnKind::Float => {
                let values: Vec<Option<f64>> =
                    cells().map(|v| v.and_then(FieldValue::as_f64)).collect();
                Series::new(name.into(), values)
            }
            ColumnKind::Text => {
                let values: Vec<Option<String>> = cells()
                    .map(|v| v.filter(|v| !v.is_blank()).map(ToString::to_string))
                    .collect();
                Series::new(name.into(), values)
            }
        };
        columns.push(series.into());
    }
    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_field_value() {
        assert_eq!(any_to_field_value(AnyValue::Int32(5)), FieldValue::Int(5));
        assert_eq!(any_to_field_value(AnyValue::Float64(1.5)), FieldValue::Float(1.5));
        assert_eq!(any_to_field_value(AnyValue::String("  ")), FieldValue::Null);
        assert_eq!(any_to_field_value(AnyValue::Boolean(true)), FieldValue::Bool(true));
        assert_eq!(any_to_field_value(AnyValue::Null), FieldValue::Null);
    }

    #[test]
    fn test_column_kind_widening() {
        let ints = [FieldValue::Int(1), FieldValue::Null, FieldValue::Int(2)];
        assert_eq!(column_kind(ints.iter()), ColumnKind::Int);
        let mixed_numeric = [FieldValue::Int(1), FieldValue::Float(2.5)];
        assert_eq!(column_kind(mixed_numeric.iter()), ColumnKind::Float);
        let mixed = [FieldValue::Bool(true), FieldValue::Int(1)];
        assert_eq!(column_kind(mixed.iter()), ColumnKind::Text);
    }

    #[test]
    fn test_records_frame_roundtrip_keeps_types() {
        let records = vec![
            Record::new(1)
                .with("Id", FieldValue::text("a1"))
                .with("Amount", FieldValue::Int(10))
                .with("Active", FieldValue::Bool(true)),
            Record::new(2)
                .with("Id", FieldValue::text("a2"))
                .with("Rate", FieldValue::Float(0.25)),
        ];

        let df = records_to_dataframe(&records).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);

        let back = dataframe_to_records(&df);
        assert_eq!(back[0].get("Amount"), Some(&FieldValue::Int(10)));
        assert_eq!(back[0].get("Active"), Some(&FieldValue::Bool(true)));
        assert_eq!(back[0].get("Rate"), Some(&FieldValue::Null));
        assert_eq!(back[1].get("Rate"), Some(&FieldValue::Float(0.25)));
        assert_eq!(back[1].line_number, 2);
    }
}
