//! Set difference and field isolation for one source pair.

use std::collections::BTreeSet;

use orgdiff_model::{DifferenceRecord, PairStats, SideValue, SourceValue};

use super::unify::{KeyedRecord, SourceIndex};
use crate::equality::{EngineOptions, classify, values_equal};

/// What an ordered pass over `set(A) - set(B)` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassMode {
    /// Missing records and value differences.
    Full,
    /// Missing records only; value differences come from the other pass.
    MissingOnly,
}

pub(crate) struct PairContext<'a> {
    pub object_type: &'a str,
    pub key_field: &'a str,
    pub options: &'a EngineOptions,
}

impl PairContext<'_> {
    fn difference(
        &self,
        key_value: &str,
        field: &str,
        left: (&str, SideValue),
        right: (&str, SideValue),
    ) -> DifferenceRecord {
        DifferenceRecord {
            object_type: self.object_type.to_string(),
            key_field: self.key_field.to_string(),
            key_value: key_value.to_string(),
            field: field.to_string(),
            kind: classify(&left.1, &right.1),
            left: SourceValue {
                source: left.0.to_string(),
                value: left.1,
            },
            right: SourceValue {
                source: right.0.to_string(),
                value: right.1,
            },
        }
    }

    /// One `RECORD_MISSING` per comparable field of `record`.
    fn missing(&self, record: &KeyedRecord, present: &str, absent: &str) -> Vec<DifferenceRecord> {
        record
            .fields
            .iter()
            .map(|(field, value)| {
                self.difference(
                    &record.key_value,
                    field,
                    (present, SideValue::Present(value.clone())),
                    (absent, SideValue::Missing),
                )
            })
            .collect()
    }

    fn isolate(
        &self,
        left: &KeyedRecord,
        left_source: &str,
        right: &KeyedRecord,
        right_source: &str,
    ) -> Vec<DifferenceRecord> {
        let fields: BTreeSet<&String> = left.fields.keys().chain(right.fields.keys()).collect();
        fields
            .into_iter()
            .filter_map(|field| {
                let a = left.value(field);
                let b = right.value(field);
                if values_equal(&a, &b, self.options) {
                    return None;
                }
                Some(self.difference(
                    &left.key_value,
                    field,
                    (left_source, SideValue::Present(a)),
                    (right_source, SideValue::Present(b)),
                ))
            })
            .collect()
    }

    /// Walks `set(a) - set(b)`; output is oriented `a` then `b`.
    fn ordered_pass(&self, a: &SourceIndex, b: &SourceIndex, mode: PassMode) -> Vec<DifferenceRecord> {
        let mut out = Vec::new();
        for record in a.by_key.values() {
            if b.composites.contains(&record.composite) {
                continue;
            }
            match b.by_key.get(&record.key_value) {
                None => out.extend(self.missing(record, &a.source, &b.source)),
                Some(other) if mode == PassMode::Full => {
                    out.extend(self.isolate(record, &a.source, other, &b.source));
                }
                Some(_) => {}
            }
        }
        out
    }

    /// All differences between `left` and `right`, oriented `left` then
    /// `right`, each (key, field) reported once.
    pub fn diff(&self, left: &SourceIndex, right: &SourceIndex) -> Vec<DifferenceRecord> {
        let mut out = self.ordered_pass(left, right, PassMode::Full);
        out.extend(
            self.ordered_pass(right, left, PassMode::MissingOnly)
                .into_iter()
                .map(swap_sides),
        );
        out
    }
}

fn swap_sides(mut diff: DifferenceRecord) -> DifferenceRecord {
    std::mem::swap(&mut diff.left, &mut diff.right);
    diff
}

/// Key overlap of two sources.
pub(crate) fn pair_stats(left: &SourceIndex, right: &SourceIndex, differences: usize) -> PairStats {
    let common_keys = left
        .by_key
        .keys()
        .filter(|key| right.by_key.contains_key(*key))
        .count();
    PairStats {
        left: left.source.clone(),
        right: right.source.clone(),
        common_keys,
        left_only: left.len() - common_keys,
        right_only: right.len() - common_keys,
        differences,
    }
}
