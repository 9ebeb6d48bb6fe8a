//! Aggregation of difference records into a comparison summary.

use std::collections::{BTreeMap, BTreeSet};

use orgdiff_model::{DifferenceKind, DifferenceRecord, ObjectOutcome, ObjectStatus, PairStats};
use serde::Serialize;

/// Difference counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    #[serde(rename = "RECORD_MISSING")]
    pub record_missing: usize,
    #[serde(rename = "NULL_VALUE_DIFFERENCE")]
    pub null_value_difference: usize,
    #[serde(rename = "VALUE_DIFFERENCE")]
    pub value_difference: usize,
}

impl KindCounts {
    pub fn add(&mut self, kind: DifferenceKind) {
        match kind {
            DifferenceKind::RecordMissing => self.record_missing += 1,
            DifferenceKind::NullValueDifference => self.null_value_difference += 1,
            DifferenceKind::ValueDifference => self.value_difference += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.record_missing + self.null_value_difference + self.value_difference
    }

    fn merge(&mut self, other: &KindCounts) {
        self.record_missing += other.record_missing;
        self.null_value_difference += other.null_value_difference;
        self.value_difference += other.value_difference;
    }
}

/// How widespread differences in one field are.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSummary {
    pub differing_keys: usize,
    /// Share of all keys of the object type, in percent.
    pub percent_of_keys: f64,
}

/// Statistics for one object type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSummary {
    pub object_type: String,
    pub key_field: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub sources: Vec<String>,
    pub total_keys: usize,
    pub differing_keys: usize,
    pub differing_fields: usize,
    /// Source pairs compared.
    pub total_comparisons: usize,
    pub comparisons_with_differences: usize,
    /// `(total - with_differences) / total * 100`; 100 without pairs.
    pub consistency_score: f64,
    pub difference_counts: KindCounts,
    pub fields: BTreeMap<String, FieldSummary>,
    pub pairs: Vec<PairStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ObjectSummary {
    fn from_outcome(outcome: &ObjectOutcome) -> Self {
        Self {
            object_type: outcome.object_type.clone(),
            key_field: outcome.key_field.clone(),
            status: outcome.status.label().to_string(),
            reason: outcome.status.reason(),
            sources: outcome.sources.clone(),
            total_keys: outcome.total_keys,
            differing_keys: 0,
            differing_fields: 0,
            total_comparisons: outcome.pair_count(),
            comparisons_with_differences: 0,
            consistency_score: 100.0,
            difference_counts: KindCounts::default(),
            fields: BTreeMap::new(),
            pairs: outcome.pairs.clone(),
            warnings: outcome.warnings.clone(),
        }
    }

    fn empty(object_type: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            key_field: None,
            status: ObjectStatus::Completed.label().to_string(),
            reason: None,
            sources: Vec::new(),
            total_keys: 0,
            differing_keys: 0,
            differing_fields: 0,
            total_comparisons: 0,
            comparisons_with_differences: 0,
            consistency_score: 100.0,
            difference_counts: KindCounts::default(),
            fields: BTreeMap::new(),
            pairs: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Run-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_differences: usize,
    pub objects_compared: usize,
    pub objects_skipped: usize,
    pub objects_errored: usize,
    pub objects_with_differences: usize,
    pub difference_counts: KindCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub objects: BTreeMap<String, ObjectSummary>,
    pub totals: Totals,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Default)]
struct ObjectAccumulator<'a> {
    keys: BTreeSet<&'a str>,
    pairs: BTreeSet<(&'a str, &'a str)>,
    field_keys: BTreeMap<&'a str, BTreeSet<&'a str>>,
    counts: KindCounts,
}

/// Pure reduction of differences and per-object outcomes.
pub fn summarize(differences: &[DifferenceRecord], outcomes: &[ObjectOutcome]) -> ComparisonSummary {
    let mut accumulators: BTreeMap<&str, ObjectAccumulator<'_>> = BTreeMap::new();
    for diff in differences {
        let acc = accumulators.entry(diff.object_type.as_str()).or_default();
        acc.keys.insert(&diff.key_value);
        acc.pairs.insert(diff.pair());
        acc.field_keys
            .entry(diff.field.as_str())
            .or_default()
            .insert(&diff.key_value);
        acc.counts.add(diff.kind);
    }

    let mut objects: BTreeMap<String, ObjectSummary> = outcomes
        .iter()
        .map(|outcome| (outcome.object_type.clone(), ObjectSummary::from_outcome(outcome)))
        .collect();

    for (object_type, acc) in &accumulators {
        let summary = objects
            .entry((*object_type).to_string())
            .or_insert_with(|| ObjectSummary::empty(object_type));
        summary.differing_keys = acc.keys.len();
        summary.differing_fields = acc.field_keys.len();
        summary.comparisons_with_differences = acc.pairs.len();
        summary.total_comparisons = summary.total_comparisons.max(acc.pairs.len());
        summary.difference_counts = acc.counts;
        let total_keys = summary.total_keys.max(acc.keys.len());
        summary.fields = acc
            .field_keys
            .iter()
            .map(|(field, keys)| {
                (
                    (*field).to_string(),
                    FieldSummary {
                        differing_keys: keys.len(),
                        percent_of_keys: percent(keys.len(), total_keys),
                    },
                )
            })
            .collect();
    }

    let mut totals = Totals::default();
    for summary in objects.values_mut() {
        if summary.total_comparisons > 0 {
            let consistent = summary.total_comparisons - summary.comparisons_with_differences;
            summary.consistency_score = percent(consistent, summary.total_comparisons);
        }
        match summary.status.as_str() {
            "completed" => totals.objects_compared += 1,
            "skipped" => totals.objects_skipped += 1,
            _ => totals.objects_errored += 1,
        }
        if summary.difference_counts.total() > 0 {
            totals.objects_with_differences += 1;
        }
        totals.difference_counts.merge(&summary.difference_counts);
    }
    totals.total_differences = differences.len();

    ComparisonSummary { objects, totals }
}
