//! Resolution of duplicate keys against a real directory tree.

use std::fs;
use std::io;
use std::path::Path;

use orgdiff_core::{Blacklist, CompareInput, DirectoryProvider, compare, detect_all};
use orgdiff_ingest::discover;
use orgdiff_model::OrgDiffError;
use orgdiff_resolve::{
    BLACKLIST_FILE_NAME, ContentWriter, RESOLUTION_SUMMARY_FILE_NAME, ResolutionDocument, Resolver,
    apply, load_blacklist,
};
use serde_json::json;
use tempfile::TempDir;

const CONFIG: &str = r#"{"objects": {"Account": {"foreignKey": "Ext"}}, "orgs": []}"#;

const ORG_A: &str = concat!(
    "{\"Ext\":\"W\",\"Name\":\"w\"}\n",
    "{\"Ext\":\"X\",\"Name\":\"first\"}\n",
    "{\"Ext\":\"Y\",\"Name\":\"y\"}\n",
    "{broken\n",
    "{\"Ext\":\"Z\",\"Name\":\"z\"}\n",
    "{\"Ext\":\"V\",\"Name\":\"v\"}\n",
    "{\"Ext\":\"X\",\"Name\":\"second\"}\n",
);

fn fixture() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config_test.json"), CONFIG).unwrap();
    for (source, contents) in [
        ("orgA", ORG_A),
        ("orgB", "{\"Ext\":\"X\",\"Name\":\"second\"}\n{\"Ext\":\"Q\",\"Name\":\"q\"}\n"),
    ] {
        let dir = root.path().join(source);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Account.jsonl"), contents).unwrap();
    }
    root
}

fn account_file(root: &Path) -> std::path::PathBuf {
    root.join("orgA").join("Account.jsonl")
}

fn fingerprint_of(root: &Path, line: usize) -> String {
    let scan = detect_all(&discover(root).unwrap());
    scan.duplicates["orgA"].objects["Account"].duplicates["X"]
        .members
        .iter()
        .find(|member| member.line_number == line)
        .map(|member| member.fingerprint.clone())
        .unwrap()
}

struct FailingWriter;

impl ContentWriter for FailingWriter {
    fn write(&self, path: &Path, _contents: &[u8]) -> io::Result<()> {
        fs::write(path, b"partial")?;
        Err(io::Error::other("no space left on device"))
    }
}

#[test]
fn keep_line_removes_other_members_and_is_idempotent() {
    let root = fixture();
    let fingerprint = fingerprint_of(root.path(), 7);
    let resolutions: ResolutionDocument = [(
        "orgA:Account:X".to_string(),
        json!({"action": "keep_line", "target_line": 7, "fingerprint": fingerprint}),
    )]
    .into_iter()
    .collect();

    let mut blacklist = Blacklist::new();
    let summary = apply(root.path(), &resolutions, &mut blacklist).unwrap();

    assert!(summary.is_clean(), "{:?}", summary.failures);
    assert_eq!(summary.resolved_count, 1);
    assert_eq!(summary.records_removed, 1);
    let after_first = fs::read_to_string(account_file(root.path())).unwrap();
    assert!(!after_first.contains("first"));
    assert!(after_first.contains("{broken\n"));
    assert_eq!(after_first.lines().count(), 6);
    assert!(account_file(root.path()).with_extension("jsonl.backup").exists());
    assert!(root.path().join(RESOLUTION_SUMMARY_FILE_NAME).exists());

    let scan = detect_all(&discover(root.path()).unwrap());
    assert!(!scan.has_duplicates());

    let again = apply(root.path(), &resolutions, &mut blacklist).unwrap();
    assert!(again.is_clean());
    assert_eq!(again.records_removed, 0);
    assert_eq!(fs::read_to_string(account_file(root.path())).unwrap(), after_first);
}

#[test]
fn several_keys_in_one_collection_use_reviewed_line_numbers() {
    let root = fixture();
    fs::write(
        account_file(root.path()),
        concat!(
            "{\"Ext\":\"A\",\"Name\":\"a1\"}\n",
            "{\"Ext\":\"A\",\"Name\":\"a2\"}\n",
            "{\"Ext\":\"B\",\"Name\":\"b1\"}\n",
            "{\"Ext\":\"B\",\"Name\":\"b2\"}\n",
            "{\"Ext\":\"B\",\"Name\":\"b3\"}\n",
        ),
    )
    .unwrap();
    let scan = detect_all(&discover(root.path()).unwrap());
    let groups = &scan.duplicates["orgA"].objects["Account"].duplicates;
    let fingerprint = |key: &str, line: usize| {
        groups[key]
            .members
            .iter()
            .find(|member| member.line_number == line)
            .map(|member| member.fingerprint.clone())
            .unwrap()
    };
    let resolutions: ResolutionDocument = [
        (
            "orgA:Account:A".to_string(),
            json!({"action": "keep_line", "target_line": 1, "fingerprint": fingerprint("A", 1)}),
        ),
        (
            "orgA:Account:B".to_string(),
            json!({"action": "keep_line", "target_line": 4, "fingerprint": fingerprint("B", 4)}),
        ),
    ]
    .into_iter()
    .collect();

    let summary = apply(root.path(), &resolutions, &mut Blacklist::new()).unwrap();

    assert!(summary.is_clean(), "{:?}", summary.failures);
    assert_eq!(summary.resolved_count, 2);
    assert_eq!(summary.records_removed, 3);
    assert_eq!(
        fs::read_to_string(account_file(root.path())).unwrap(),
        "{\"Ext\":\"A\",\"Name\":\"a1\"}\n{\"Ext\":\"B\",\"Name\":\"b2\"}\n"
    );

    let unfingerprinted: ResolutionDocument = [
        ("orgA:Account:A".to_string(), json!({"action": "keep_line", "target_line": 1})),
        ("orgA:Account:B".to_string(), json!({"action": "keep_line", "target_line": 4})),
    ]
    .into_iter()
    .collect();
    let again = apply(root.path(), &unfingerprinted, &mut Blacklist::new()).unwrap();
    assert!(again.is_clean());
    assert_eq!(again.records_removed, 0);
}

#[test]
fn fingerprint_mismatch_leaves_file_untouched() {
    let root = fixture();
    let wrong = fingerprint_of(root.path(), 2);
    let resolutions: ResolutionDocument = [(
        "orgA:Account:X".to_string(),
        json!({"action": "keep_line", "target_line": 7, "fingerprint": wrong}),
    )]
    .into_iter()
    .collect();

    let summary = apply(root.path(), &resolutions, &mut Blacklist::new()).unwrap();

    assert_eq!(summary.resolved_count, 0);
    assert!(matches!(summary.failures[0], OrgDiffError::Resolution { .. }));
    assert_eq!(fs::read_to_string(account_file(root.path())).unwrap(), ORG_A);
}

#[test]
fn write_failure_restores_original_bytes() {
    let root = fixture();
    let resolver = Resolver::new(
        root.path(),
        [("Account".to_string(), "Ext".to_string())].into(),
    )
    .with_writer(FailingWriter);
    let resolutions: ResolutionDocument = [(
        "orgA:Account:X".to_string(),
        json!({"action": "choose", "chosen_line_number": "7"}),
    )]
    .into_iter()
    .collect();

    let summary = resolver.apply(&resolutions, &mut Blacklist::new());

    assert_eq!(summary.resolved_count, 0);
    assert!(matches!(summary.failures[0], OrgDiffError::Write { .. }));
    assert_eq!(fs::read(account_file(root.path())).unwrap(), ORG_A.as_bytes());
    assert!(!root.path().join("orgA/Account.jsonl.tmp").exists());
}

#[test]
fn batch_continues_past_bad_entries_and_blacklists_keys() {
    let root = fixture();
    let resolutions: ResolutionDocument = [
        ("orgA:Account".to_string(), json!({"action": "skip"})),
        ("orgA:Account:W".to_string(), json!({"action": "merge"})),
        ("orgZ:Account:X".to_string(), json!({"action": "keep_line", "target_line": 1})),
        ("orgA:Account:X".to_string(), json!({"action": "skip"})),
        ("orgA:Account:Q".to_string(), json!({"action": "blacklist_key"})),
    ]
    .into_iter()
    .collect();

    let mut blacklist = Blacklist::new();
    let summary = apply(root.path(), &resolutions, &mut blacklist).unwrap();

    assert_eq!(summary.total_resolutions, 5);
    assert_eq!(summary.blacklisted_count, 2);
    assert_eq!(summary.failures.len(), 3);
    assert_eq!(fs::read_to_string(account_file(root.path())).unwrap(), ORG_A);

    let saved = load_blacklist(root.path()).unwrap();
    assert!(saved.contains("Account", "X"));
    assert!(saved.contains("Account", "Q"));
    assert!(root.path().join(BLACKLIST_FILE_NAME).exists());

    let discovery = discover(root.path()).unwrap();
    let input = CompareInput::new(discovery.key_field_map.clone()).with_blacklist(saved);
    let outcome = compare(
        &input,
        &DirectoryProvider::new(root.path()),
        &discovery.sources,
        &discovery.comparable_object_types(),
    );
    assert!(
        outcome
            .differences
            .iter()
            .all(|diff| diff.key_value != "X" && diff.key_value != "Q")
    );
}
