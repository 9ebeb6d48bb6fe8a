//! Type-aware field equality and difference classification.

use orgdiff_model::{DifferenceKind, FieldValue, SideValue};
use serde::Serialize;

/// Numeric comparison tolerances.
///
/// Two numbers `a` and `b` are equal when
/// `|a - b| <= atol + rtol * max(|a|, |b|)`, which is symmetric in `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineOptions {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-9,
            atol: 1e-9,
        }
    }
}

fn numbers_close(a: f64, b: f64, options: &EngineOptions) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= options.atol + options.rtol * a.abs().max(b.abs())
}

/// Equality of two field values.
///
/// Blank values (null or empty text) are equal to each other. Integers
/// compare exactly. When at least one side is a number and the other has a
/// numeric view, the tolerance applies. Booleans and text compare exactly;
/// other mixes compare by display text.
pub fn values_equal(left: &FieldValue, right: &FieldValue, options: &EngineOptions) -> bool {
    match (left.is_blank(), right.is_blank()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        (false, false) => {}
    }

    match (left, right) {
        (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
        (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
        _ if left.is_numeric() || right.is_numeric() => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => numbers_close(a, b, options),
            _ => left.to_string() == right.to_string(),
        },
        _ => left.to_string() == right.to_string(),
    }
}

/// Classifies two sides already known to differ.
///
/// Missing wins over null, null wins over a plain value difference.
pub fn classify(left: &SideValue, right: &SideValue) -> DifferenceKind {
    if left.is_missing() || right.is_missing() {
        DifferenceKind::RecordMissing
    } else if left.is_blank() || right.is_blank() {
        DifferenceKind::NullValueDifference
    } else {
        DifferenceKind::ValueDifference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eq(a: FieldValue, b: FieldValue) -> bool {
        values_equal(&a, &b, &EngineOptions::default())
    }

    #[test]
    fn test_blank_values() {
        assert!(eq(FieldValue::Null, FieldValue::Text(String::new())));
        assert!(eq(FieldValue::Text("  ".into()), FieldValue::Null));
        assert!(!eq(FieldValue::Null, FieldValue::Int(0)));
    }

    #[test]
    fn test_numeric_tolerance() {
        assert!(eq(FieldValue::Float(100.0), FieldValue::Float(100.000_000_000_1)));
        assert!(!eq(FieldValue::Float(100.0), FieldValue::Float(100.5)));
        assert!(eq(FieldValue::Int(100), FieldValue::Float(100.0)));
        assert!(eq(FieldValue::Text("100.00".into()), FieldValue::Int(100)));
        assert!(eq(FieldValue::Float(f64::NAN), FieldValue::Float(f64::NAN)));
        assert!(!eq(FieldValue::Float(f64::NAN), FieldValue::Float(1.0)));
        assert!(eq(FieldValue::Float(f64::INFINITY), FieldValue::Float(f64::INFINITY)));
        assert!(!eq(FieldValue::Int(1_000_000_000_000), FieldValue::Int(1_000_000_000_001)));
    }

    #[test]
    fn test_tolerance_does_not_depend_on_argument_order() {
        let options = EngineOptions { rtol: 0.1, atol: 0.0 };
        let (a, b) = (FieldValue::Float(1.0), FieldValue::Float(1.1));
        assert!(values_equal(&a, &b, &options));
        assert!(values_equal(&b, &a, &options));
    }

    #[test]
    fn test_text_and_mixed() {
        assert!(!eq(FieldValue::Text("100".into()), FieldValue::Text("100.0".into())));
        assert!(!eq(FieldValue::Text("Acme".into()), FieldValue::Text("acme".into())));
        assert!(eq(FieldValue::Bool(true), FieldValue::Text("true".into())));
        assert!(!eq(FieldValue::Bool(true), FieldValue::Int(1)));
        assert!(!eq(FieldValue::Text("abc".into()), FieldValue::Int(1)));
    }

    #[test]
    fn test_classify_order() {
        let present = |v: FieldValue| SideValue::Present(v);
        assert_eq!(
            classify(&SideValue::Missing, &present(FieldValue::Null)),
            DifferenceKind::RecordMissing
        );
        assert_eq!(
            classify(&present(FieldValue::Null), &present(FieldValue::Int(1))),
            DifferenceKind::NullValueDifference
        );
        assert_eq!(
            classify(&present(FieldValue::Int(2)), &present(FieldValue::Int(1))),
            DifferenceKind::ValueDifference
        );
    }

    proptest! {
        #[test]
        fn prop_values_within_tolerance_are_equal(
            base in -1.0e12f64..1.0e12,
            frac in -0.5f64..0.5,
        ) {
            let options = EngineOptions::default();
            let allowed = options.atol + options.rtol * base.abs();
            let other = base + frac * allowed;
            prop_assert!(values_equal(
                &FieldValue::Float(other),
                &FieldValue::Float(base),
                &options
            ));
        }

        #[test]
        fn prop_equality_is_symmetric(
            a in -1.0e6f64..1.0e6,
            b in -1.0e6f64..1.0e6,
            rtol in 0.0f64..0.5,
        ) {
            let options = EngineOptions { rtol, atol: 1e-9 };
            let (a, b) = (FieldValue::Float(a), FieldValue::Float(b));
            prop_assert_eq!(values_equal(&a, &b, &options), values_equal(&b, &a, &options));
        }

        #[test]
        fn prop_equality_is_reflexive(value in prop_oneof![
            any::<i64>().prop_map(FieldValue::Int),
            any::<f64>().prop_map(FieldValue::Float),
            any::<bool>().prop_map(FieldValue::Bool),
            ".*".prop_map(FieldValue::Text),
        ]) {
            prop_assert!(values_equal(&value, &value, &EngineOptions::default()));
        }
    }
}
