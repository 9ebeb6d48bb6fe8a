//! Set-based all-vs-all comparison engine.
//!
//! Per object type, every source's records are indexed by key value and by a
//! composite content key. For each unordered source pair only the records in
//! the set difference are inspected field by field, so identical records
//! cost one hash lookup.

mod pair;
mod unify;

use std::collections::BTreeSet;

use orgdiff_model::{
    DifferenceRecord, KeyFieldMap, ObjectOutcome, ObjectStatus, OrgDiffError, Record, Result,
    SkipReason,
};
use tracing::{info, info_span, warn};

use crate::blacklist::Blacklist;
use crate::cancel::CancelFlag;
use crate::equality::EngineOptions;
use crate::provider::RecordProvider;

use pair::{PairContext, pair_stats};
use unify::{SourceIndex, UnifyContext, unify};

/// Immutable inputs of one comparison run.
#[derive(Debug, Clone, Default)]
pub struct CompareInput {
    pub key_fields: KeyFieldMap,
    /// Effective excluded field names.
    pub exclusions: BTreeSet<String>,
    pub blacklist: Blacklist,
    pub options: EngineOptions,
    pub cancel: CancelFlag,
}

impl CompareInput {
    pub fn new(key_fields: KeyFieldMap) -> Self {
        Self {
            key_fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusions: BTreeSet<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    #[must_use]
    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Differences and per-object outcomes of a run.
#[derive(Debug, Clone, Default)]
pub struct CompareOutcome {
    /// Sorted by object type, key value, field, then source pair.
    pub differences: Vec<DifferenceRecord>,
    /// One entry per requested object type, sorted by object type.
    pub outcomes: Vec<ObjectOutcome>,
}

impl CompareOutcome {
    pub fn has_errors(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome.status, ObjectStatus::Error { .. }))
    }
}

fn sort_differences(differences: &mut [DifferenceRecord]) {
    differences.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Compares `object_types` across `sources`.
///
/// Never fails as a whole: per object type problems end up in the outcome's
/// status and warnings.
pub fn compare<P>(
    input: &CompareInput,
    provider: &P,
    sources: &[String],
    object_types: &[String],
) -> CompareOutcome
where
    P: RecordProvider + ?Sized,
{
    let sources: BTreeSet<&str> = sources.iter().map(String::as_str).collect();
    let object_types: BTreeSet<&str> = object_types.iter().map(String::as_str).collect();
    let mut result = CompareOutcome::default();

    for object_type in object_types {
        let key_field = input.key_fields.get(object_type);
        if input.cancel.is_cancelled() {
            result.outcomes.push(ObjectOutcome::skipped(
                object_type,
                key_field.cloned(),
                SkipReason::Cancelled,
            ));
            continue;
        }
        let Some(key_field) = key_field else {
            info!(object = object_type, "skipping object without key field");
            result.outcomes.push(ObjectOutcome::skipped(
                object_type,
                None,
                SkipReason::NoKeyField,
            ));
            continue;
        };

        let span = info_span!("compare", object = object_type, key_field = %key_field);
        let _guard = span.enter();
        let (outcome, differences) = compare_object(input, provider, &sources, object_type, key_field);
        result.differences.extend(differences);
        result.outcomes.push(outcome);
    }

    sort_differences(&mut result.differences);
    result
}

fn compare_object<P>(
    input: &CompareInput,
    provider: &P,
    sources: &BTreeSet<&str>,
    object_type: &str,
    key_field: &str,
) -> (ObjectOutcome, Vec<DifferenceRecord>)
where
    P: RecordProvider + ?Sized,
{
    let ctx = UnifyContext {
        object_type,
        key_field,
        exclusions: &input.exclusions,
        blacklist: &input.blacklist,
    };

    let mut warnings = Vec::new();
    let mut load_failures = 0usize;
    let mut indexes: Vec<SourceIndex> = Vec::with_capacity(sources.len());
    for source in sources {
        match provider.load(source, object_type) {
            Ok(loaded) => {
                warnings.extend(
                    loaded
                        .warnings
                        .into_iter()
                        .map(|warning| format!("{source}: {warning}")),
                );
                let (index, unify_warnings) = unify(&ctx, source, &loaded.records);
                warnings.extend(unify_warnings);
                indexes.push(index);
            }
            Err(err) => {
                warn!(source = %source, error = %err, "source excluded from comparison");
                load_failures += 1;
                warnings.push(err.to_string());
            }
        }
    }

    let mut outcome = ObjectOutcome {
        object_type: object_type.to_string(),
        key_field: Some(key_field.to_string()),
        status: ObjectStatus::Completed,
        sources: indexes.iter().map(|index| index.source.clone()).collect(),
        total_keys: 0,
        pairs: Vec::new(),
        warnings,
    };

    if indexes.len() < 2 {
        outcome.status = if indexes.is_empty() && load_failures > 0 {
            ObjectStatus::Error {
                reason: format!("no source could be loaded: {}", outcome.warnings.join("; ")),
            }
        } else {
            ObjectStatus::Skipped {
                reason: SkipReason::InsufficientSources {
                    available: indexes.len(),
                },
            }
        };
        warn!(status = outcome.status.label(), reason = ?outcome.status.reason(), "object not compared");
        return (outcome, Vec::new());
    }

    outcome.total_keys = indexes
        .iter()
        .flat_map(|index| index.by_key.keys())
        .collect::<BTreeSet<_>>()
        .len();

    let pair_ctx = PairContext {
        object_type,
        key_field,
        options: &input.options,
    };
    let mut differences = Vec::new();
    for (i, left) in indexes.iter().enumerate() {
        for right in &indexes[i + 1..] {
            let pair_differences = pair_ctx.diff(left, right);
            outcome
                .pairs
                .push(pair_stats(left, right, pair_differences.len()));
            differences.extend(pair_differences);
        }
    }
    sort_differences(&mut differences);

    info!(
        sources = outcome.sources.len(),
        keys = outcome.total_keys,
        differences = differences.len(),
        "object compared"
    );
    (outcome, differences)
}

/// Differences between two record sets of one object type, oriented
/// `left` then `right`.
///
/// Missing records on either side and value differences are each reported
/// once per (key, field). Swapping the arguments yields the same records
/// with their sides swapped.
pub fn compare_pair(
    input: &CompareInput,
    object_type: &str,
    left: (&str, &[Record]),
    right: (&str, &[Record]),
) -> Result<Vec<DifferenceRecord>> {
    let key_field = input.key_fields.get(object_type).ok_or_else(|| {
        OrgDiffError::configuration(format!("no key field configured for {object_type}"))
    })?;
    let ctx = UnifyContext {
        object_type,
        key_field,
        exclusions: &input.exclusions,
        blacklist: &input.blacklist,
    };
    let (left_index, _) = unify(&ctx, left.0, left.1);
    let (right_index, _) = unify(&ctx, right.0, right.1);

    let pair_ctx = PairContext {
        object_type,
        key_field,
        options: &input.options,
    };
    let mut differences = pair_ctx.diff(&left_index, &right_index);
    sort_differences(&mut differences);
    Ok(differences)
}
