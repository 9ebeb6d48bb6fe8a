//! Tests for source discovery.

use std::fs;
use std::path::Path;

use orgdiff_ingest::{IngestError, discover};
use tempfile::TempDir;

const CONFIG: &str = r#"{
    "objects": {
        "Account": {"foreignKey": "External_Id__c"},
        "Contact": {"foreignKey": "Email"}
    },
    "orgs": [{"username": "prod@acme.com", "alias": "Production"}]
}"#;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "{}\n").expect("write file");
}

fn source(root: &Path, name: &str, files: &[&str]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).expect("create source dir");
    for file in files {
        touch(&dir, file);
    }
}

#[test]
fn discovers_sources_common_and_partial_objects() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config_run.json"), CONFIG).unwrap();
    source(
        root.path(),
        "prod_acme_com",
        &["Account.jsonl", "Contact.csv", "Product2.jsonl", "Quote.jsonl"],
    );
    source(
        root.path(),
        "uat_acme_com",
        &["Account.parquet", "Contact.jsonl", "Product2.csv"],
    );
    source(root.path(), "comparison_results", &["Account.jsonl"]);
    source(root.path(), ".buffers", &["Account.jsonl"]);

    let discovery = discover(root.path()).expect("discover");

    assert_eq!(discovery.sources, vec!["prod_acme_com", "uat_acme_com"]);
    assert_eq!(
        discovery.common_object_types,
        vec!["Account", "Contact", "Product2"]
    );
    assert_eq!(
        discovery.partial_object_types.get("Quote"),
        Some(&vec!["prod_acme_com".to_string()])
    );
    assert_eq!(discovery.unkeyed_object_types, vec!["Product2"]);
    assert_eq!(discovery.comparable_object_types(), vec!["Account", "Contact"]);
    assert_eq!(discovery.key_field("Account"), Some("External_Id__c"));
    assert_eq!(discovery.display_name("prod_acme_com"), "Production");
    assert_eq!(discovery.display_name("uat_acme_com"), "uat_acme_com");
}

#[test]
fn single_source_is_a_configuration_error() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config_run.json"), CONFIG).unwrap();
    source(root.path(), "only_org", &["Account.jsonl"]);

    let err = discover(root.path()).unwrap_err();
    assert!(matches!(err, IngestError::Configuration { .. }));
}

#[test]
fn missing_key_configuration_is_a_configuration_error() {
    let root = TempDir::new().unwrap();
    source(root.path(), "a", &["Account.jsonl"]);
    source(root.path(), "b", &["Account.jsonl"]);

    let err = discover(root.path()).unwrap_err();
    assert!(matches!(err, IngestError::Configuration { .. }));

    fs::write(root.path().join("config_empty.json"), r#"{"objects": {}}"#).unwrap();
    let err = discover(root.path()).unwrap_err();
    assert!(matches!(err, IngestError::Configuration { .. }));
}

#[test]
fn missing_root_is_reported() {
    let root = TempDir::new().unwrap();
    let err = discover(&root.path().join("nope")).unwrap_err();
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}
