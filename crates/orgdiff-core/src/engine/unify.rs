//! Per-source record index with identity and composite keys.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use orgdiff_model::{FieldValue, Fingerprint, FingerprintBuilder, Record};
use tracing::debug;

use crate::blacklist::Blacklist;

/// One record after exclusion, tagged with its key.
#[derive(Debug, Clone)]
pub(crate) struct KeyedRecord {
    pub key_value: String,
    pub composite: Fingerprint,
    pub line_number: usize,
    /// Comparable fields only (no key field, no excluded fields).
    pub fields: BTreeMap<String, FieldValue>,
}

impl KeyedRecord {
    pub fn value(&self, field: &str) -> FieldValue {
        self.fields.get(field).cloned().unwrap_or(FieldValue::Null)
    }
}

/// All comparable records of one source for one object type.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceIndex {
    pub source: String,
    /// Identity index: key value → record (first occurrence wins).
    pub by_key: BTreeMap<String, KeyedRecord>,
    pub composites: HashSet<Fingerprint>,
}

impl SourceIndex {
    pub fn len(&self) -> usize {
        self.by_key.len()
    }
}

pub(crate) struct UnifyContext<'a> {
    pub object_type: &'a str,
    pub key_field: &'a str,
    pub exclusions: &'a BTreeSet<String>,
    pub blacklist: &'a Blacklist,
}

/// Hash of (object type, key value, non-blank comparable fields).
///
/// Blank values are left out so that an absent field and an explicit null
/// produce the same key.
pub(crate) fn composite_key(
    object_type: &str,
    key_value: &str,
    fields: &BTreeMap<String, FieldValue>,
) -> Fingerprint {
    let mut builder = FingerprintBuilder::new();
    builder.component(object_type).component(key_value);
    for (name, value) in fields.iter().filter(|(_, value)| !value.is_blank()) {
        builder.field(name, value);
    }
    builder.finish()
}

/// Builds the index for `source`, returning warnings for dropped records.
pub(crate) fn unify(
    ctx: &UnifyContext<'_>,
    source: &str,
    records: &[Record],
) -> (SourceIndex, Vec<String>) {
    let mut index = SourceIndex {
        source: source.to_string(),
        ..SourceIndex::default()
    };
    let mut keyless = 0usize;
    let mut blacklisted = 0usize;
    let mut duplicate_lines = Vec::new();

    for record in records {
        let Some(key_value) = record.key_value(ctx.key_field) else {
            keyless += 1;
            continue;
        };
        if ctx.blacklist.contains(ctx.object_type, &key_value) {
            blacklisted += 1;
            continue;
        }
        if index.by_key.contains_key(&key_value) {
            duplicate_lines.push(record.line_number);
            continue;
        }

        let fields: BTreeMap<String, FieldValue> = record
            .fields
            .iter()
            .filter(|(name, _)| name.as_str() != ctx.key_field && !ctx.exclusions.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let composite = composite_key(ctx.object_type, &key_value, &fields);
        index.composites.insert(composite);
        index.by_key.insert(
            key_value.clone(),
            KeyedRecord {
                key_value,
                composite,
                line_number: record.line_number,
                fields,
            },
        );
    }

    let mut warnings = Vec::new();
    if keyless > 0 {
        warnings.push(format!(
            "{source}: {keyless} record(s) without key field '{}' excluded",
            ctx.key_field
        ));
    }
    if !duplicate_lines.is_empty() {
        warnings.push(format!(
            "{source}: {} record(s) with a duplicate key ignored (lines {:?}); first occurrence used",
            duplicate_lines.len(),
            duplicate_lines
        ));
    }
    debug!(
        source,
        records = index.len(),
        keyless,
        blacklisted,
        duplicates = duplicate_lines.len(),
        "source unified"
    );

    (index, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(exclusions: &'a BTreeSet<String>, blacklist: &'a Blacklist) -> UnifyContext<'a> {
        UnifyContext {
            object_type: "Account",
            key_field: "Ext",
            exclusions,
            blacklist,
        }
    }

    #[test]
    fn test_unify_drops_keyless_blacklisted_and_excluded() {
        let exclusions: BTreeSet<String> = ["LastModifiedDate".to_string()].into();
        let mut blacklist = Blacklist::new();
        blacklist.insert("Account", "B");
        let records = vec![
            Record::new(1)
                .with("Ext", FieldValue::text("A"))
                .with("Name", FieldValue::text("Acme"))
                .with("LastModifiedDate", FieldValue::text("2024-01-01")),
            Record::new(2).with("Name", FieldValue::text("NoKey")),
            Record::new(3).with("Ext", FieldValue::text("B")),
            Record::new(4)
                .with("Ext", FieldValue::text("A"))
                .with("Name", FieldValue::text("Second")),
        ];

        let (index, warnings) = unify(&ctx(&exclusions, &blacklist), "org1", &records);

        assert_eq!(index.len(), 1);
        let record = &index.by_key["A"];
        assert_eq!(record.line_number, 1);
        assert!(!record.fields.contains_key("Ext"));
        assert!(!record.fields.contains_key("LastModifiedDate"));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("without key field 'Ext'"));
        assert!(warnings[1].contains("[4]"));
    }

    #[test]
    fn test_composite_key_ignores_blank_fields() {
        let mut with_null = BTreeMap::new();
        with_null.insert("Name".to_string(), FieldValue::text("Acme"));
        with_null.insert("Phone".to_string(), FieldValue::Null);
        let mut without = BTreeMap::new();
        without.insert("Name".to_string(), FieldValue::text("Acme"));

        assert_eq!(
            composite_key("Account", "A", &with_null),
            composite_key("Account", "A", &without)
        );
        assert_ne!(
            composite_key("Account", "A", &without),
            composite_key("Account", "B", &without)
        );
    }
}
