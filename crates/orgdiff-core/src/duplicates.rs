//! Duplicate key detection within a single source.
//!
//! Detection is read-only. Every member of a duplicate group carries its
//! physical line number and a content fingerprint, which a later resolution
//! must present to remove the other members.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use orgdiff_ingest::{Discovery, SourceFormat, list_object_types, load_records_positional};
use orgdiff_model::{FieldValue, Record, record_fingerprint};
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::equality::{EngineOptions, values_equal};

/// One record sharing its key with at least one other record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMember {
    /// 1-based position in the physical collection.
    pub line_number: usize,
    /// Hex SHA-256 of the record content.
    pub fingerprint: String,
    #[serde(rename = "record_data")]
    pub fields: BTreeMap<String, FieldValue>,
}

/// A field that differs between the first member and a later one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub base_value: FieldValue,
    pub compare_value: FieldValue,
}

/// Field differences of one later member against the first member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDiff {
    pub base_record_line: usize,
    pub compare_record_line: usize,
    pub different_fields: BTreeMap<String, FieldDiff>,
}

/// All records of one source sharing one key value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    #[serde(rename = "foreign_key")]
    pub key_value: String,
    pub record_count: usize,
    /// Members in source order.
    #[serde(rename = "records")]
    pub members: Vec<DuplicateMember>,
    #[serde(rename = "differences")]
    pub diffs: Vec<MemberDiff>,
}

/// Duplicate groups of one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub key_field: String,
    pub groups: BTreeMap<String, DuplicateGroup>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn duplicate_keys(&self) -> usize {
        self.groups.len()
    }
}

fn member_diff(base: &Record, other: &Record) -> MemberDiff {
    let options = EngineOptions::default();
    let mut different_fields = BTreeMap::new();
    for field in base.fields.keys().chain(other.fields.keys()) {
        if different_fields.contains_key(field) {
            continue;
        }
        let base_value = base.get(field).cloned().unwrap_or(FieldValue::Null);
        let compare_value = other.get(field).cloned().unwrap_or(FieldValue::Null);
        if !values_equal(&base_value, &compare_value, &options) {
            different_fields.insert(
                field.clone(),
                FieldDiff {
                    base_value,
                    compare_value,
                },
            );
        }
    }
    MemberDiff {
        base_record_line: base.line_number,
        compare_record_line: other.line_number,
        different_fields,
    }
}

/// Groups `records` by non-empty key value and keeps groups of two or more.
pub fn detect(records: &[Record], key_field: &str) -> DuplicateReport {
    let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        if let Some(key_value) = record.key_value(key_field) {
            positions.entry(key_value).or_default().push(idx);
        }
    }

    let groups = positions
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(key_value, members)| {
            let first = &records[members[0]];
            let diffs = members[1..]
                .iter()
                .map(|&idx| member_diff(first, &records[idx]))
                .filter(|diff| !diff.different_fields.is_empty())
                .collect();
            let members: Vec<DuplicateMember> = members
                .iter()
                .map(|&idx| {
                    let record = &records[idx];
                    DuplicateMember {
                        line_number: record.line_number,
                        fingerprint: record_fingerprint(record).to_hex(),
                        fields: record.fields.clone(),
                    }
                })
                .collect();
            let group = DuplicateGroup {
                key_value: key_value.clone(),
                record_count: members.len(),
                members,
                diffs,
            };
            (key_value, group)
        })
        .collect();

    DuplicateReport {
        key_field: key_field.to_string(),
        groups,
    }
}

/// Duplicates of one object type in one source.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectDuplicates {
    pub object_name: String,
    pub foreign_key_field: String,
    pub file: PathBuf,
    pub duplicate_count: usize,
    pub duplicates: BTreeMap<String, DuplicateGroup>,
}

/// Duplicates of every object type in one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDuplicates {
    pub org_name: String,
    pub objects_with_duplicates: usize,
    pub objects: BTreeMap<String, ObjectDuplicates>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total_orgs_with_duplicates: usize,
    pub total_objects_with_duplicates: usize,
    pub total_duplicate_fks: usize,
    pub requires_resolution: bool,
}

/// Duplicate scan over every source of a discovery.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateScan {
    pub summary: ScanSummary,
    pub duplicates: BTreeMap<String, SourceDuplicates>,
    /// Collections that could not be read.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DuplicateScan {
    pub fn has_duplicates(&self) -> bool {
        self.summary.total_duplicate_fks > 0
    }

    fn finish(mut self) -> Self {
        let objects: usize = self
            .duplicates
            .values()
            .map(|source| source.objects_with_duplicates)
            .sum();
        let keys: usize = self
            .duplicates
            .values()
            .flat_map(|source| source.objects.values())
            .map(|object| object.duplicate_count)
            .sum();
        self.summary = ScanSummary {
            total_orgs_with_duplicates: self.duplicates.len(),
            total_objects_with_duplicates: objects,
            total_duplicate_fks: keys,
            requires_resolution: keys > 0,
        };
        self
    }
}

/// Scans every keyed object type of every source for duplicate keys.
///
/// Collections are read in positional order (JSONL first) so that reported
/// line numbers match the file a resolution rewrites.
pub fn detect_all(discovery: &Discovery) -> DuplicateScan {
    let mut scan = DuplicateScan::default();

    for source in &discovery.sources {
        let span = info_span!("duplicates", source = %source);
        let _guard = span.enter();
        let dir = discovery.source_dir(source);
        let object_types = match list_object_types(&dir) {
            Ok(objects) => objects,
            Err(err) => {
                warn!(error = %err, "cannot list source directory");
                scan.errors.push(format!("{source}: {err}"));
                continue;
            }
        };

        let mut objects = BTreeMap::new();
        for object_type in object_types.keys() {
            let Some(key_field) = discovery.key_field(object_type) else {
                continue;
            };
            let loaded = match load_records_positional(&dir, object_type) {
                Ok(loaded) => loaded,
                Err(err) => {
                    warn!(object = %object_type, error = %err, "cannot read collection");
                    scan.errors.push(format!("{source}/{object_type}: {err}"));
                    continue;
                }
            };
            if loaded.format == SourceFormat::Parquet {
                warn!(object = %object_type, "line numbers refer to parquet rows");
            }

            let report = detect(&loaded.records, key_field);
            if report.is_empty() {
                continue;
            }
            warn!(
                object = %object_type,
                duplicate_keys = report.duplicate_keys(),
                "duplicate keys found"
            );
            objects.insert(
                object_type.clone(),
                ObjectDuplicates {
                    object_name: object_type.clone(),
                    foreign_key_field: key_field.to_string(),
                    file: loaded.path,
                    duplicate_count: report.duplicate_keys(),
                    duplicates: report.groups,
                },
            );
        }

        if !objects.is_empty() {
            scan.duplicates.insert(
                source.clone(),
                SourceDuplicates {
                    org_name: source.clone(),
                    objects_with_duplicates: objects.len(),
                    objects,
                },
            );
        }
    }

    let scan = scan.finish();
    info!(
        sources = scan.summary.total_orgs_with_duplicates,
        objects = scan.summary.total_objects_with_duplicates,
        keys = scan.summary.total_duplicate_fks,
        "duplicate scan complete"
    );
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: usize, key: Option<&str>, name: &str) -> Record {
        let mut record = Record::new(line).with("Name", FieldValue::text(name));
        if let Some(key) = key {
            record = record.with("Ext", FieldValue::text(key));
        }
        record
    }

    #[test]
    fn test_detect_groups_and_diffs_against_first() {
        let records = vec![
            record(1, Some("A"), "Acme"),
            record(2, Some("B"), "Beta"),
            record(3, Some("A"), "Acme Corp"),
            record(4, None, "NoKey"),
            record(5, None, "NoKey"),
            record(6, Some("A"), "Acme"),
        ];

        let report = detect(&records, "Ext");
        assert_eq!(report.duplicate_keys(), 1);
        let group = &report.groups["A"];
        let lines: Vec<usize> = group.members.iter().map(|m| m.line_number).collect();
        assert_eq!(lines, vec![1, 3, 6]);
        assert_eq!(group.members[0].fingerprint, group.members[2].fingerprint);
        assert_ne!(group.members[0].fingerprint, group.members[1].fingerprint);

        // Line 6 is identical to line 1, so only line 3 has a diff.
        assert_eq!(group.diffs.len(), 1);
        assert_eq!(group.diffs[0].compare_record_line, 3);
        assert_eq!(
            group.diffs[0].different_fields["Name"].compare_value,
            FieldValue::text("Acme Corp")
        );
    }

    #[test]
    fn test_detect_empty_keys_never_group() {
        let records = vec![record(1, Some(" "), "x"), record(2, Some(""), "y")];
        assert!(detect(&records, "Ext").is_empty());
    }

    #[test]
    fn test_report_serializes_like_the_duplicate_report_file() {
        let records = vec![record(1, Some("A"), "x"), record(2, Some("A"), "y")];
        let report = detect(&records, "Ext");
        let json = serde_json::to_value(&report.groups["A"]).unwrap();
        assert_eq!(json["foreign_key"], "A");
        assert_eq!(json["record_count"], 2);
        assert_eq!(json["records"][1]["line_number"], 2);
        assert_eq!(json["records"][0]["record_data"]["Name"], "x");
        assert_eq!(json["differences"][0]["base_record_line"], 1);
    }
}
