//! Duplicate detection and directory-backed comparison.

use std::fs;
use std::path::Path;

use orgdiff_core::{CompareInput, DirectoryProvider, ExclusionPolicy, compare, detect_all};
use orgdiff_ingest::discover;
use orgdiff_model::{DifferenceKind, FieldValue};
use tempfile::TempDir;

const CONFIG: &str = r#"{
    "objects": {"Account": {"foreignKey": "Ext"}},
    "orgs": []
}"#;

fn write_source(root: &Path, source: &str, file: &str, contents: &str) {
    let dir = root.join(source);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), contents).unwrap();
}

fn fixture() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config_test.json"), CONFIG).unwrap();
    write_source(
        root.path(),
        "orgA",
        "Account.jsonl",
        concat!(
            "{\"Ext\":\"W\",\"Name\":\"w\"}\n",
            "{\"Ext\":\"X\",\"Name\":\"first\"}\n",
            "{\"Ext\":\"Y\",\"Name\":\"y\"}\n",
            "\n",
            "{\"Ext\":\"Z\",\"Name\":\"z\"}\n",
            "{\"Ext\":\"V\",\"Name\":\"v\"}\n",
            "{\"Ext\":\"X\",\"Name\":\"second\"}\n",
        ),
    );
    write_source(
        root.path(),
        "orgB",
        "Account.csv",
        "Ext,Name\nW,w\nX,second\nY,y\nZ,z\nV,v\n",
    );
    root
}

#[test]
fn reports_duplicates_with_physical_line_numbers() {
    let root = fixture();
    let discovery = discover(root.path()).unwrap();

    let scan = detect_all(&discovery);

    assert!(scan.errors.is_empty());
    assert!(scan.has_duplicates());
    assert_eq!(scan.summary.total_orgs_with_duplicates, 1);
    assert_eq!(scan.summary.total_duplicate_fks, 1);
    assert!(scan.summary.requires_resolution);

    let object = &scan.duplicates["orgA"].objects["Account"];
    assert_eq!(object.foreign_key_field, "Ext");
    assert!(object.file.ends_with("orgA/Account.jsonl"));
    let group = &object.duplicates["X"];
    assert_eq!(group.record_count, 2);
    let lines: Vec<usize> = group.members.iter().map(|m| m.line_number).collect();
    assert_eq!(lines, vec![2, 7]);
    assert_ne!(group.members[0].fingerprint, group.members[1].fingerprint);
    assert_eq!(
        group.diffs[0].different_fields["Name"].compare_value,
        FieldValue::text("second")
    );
}

#[test]
fn directory_comparison_uses_first_occurrence_of_duplicate_keys() {
    let root = fixture();
    let discovery = discover(root.path()).unwrap();
    let input = CompareInput::new(discovery.key_field_map.clone())
        .with_exclusions(ExclusionPolicy::default().effective_exclusions());
    let provider = DirectoryProvider::new(root.path());

    let outcome = compare(
        &input,
        &provider,
        &discovery.sources,
        &discovery.comparable_object_types(),
    );

    assert_eq!(outcome.differences.len(), 1);
    let diff = &outcome.differences[0];
    assert_eq!(diff.key_value, "X");
    assert_eq!(diff.kind, DifferenceKind::ValueDifference);
    assert!(
        outcome.outcomes[0]
            .warnings
            .iter()
            .any(|warning| warning.contains("duplicate key"))
    );
    assert!(root.path().join("orgA/Account.parquet").exists());
}
