//! The `blacklisted_foreign_keys.json` artifact.

use std::path::{Path, PathBuf};

use chrono::Utc;
use orgdiff_core::Blacklist;
use orgdiff_model::{OrgDiffError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::atomic::{ContentWriter, write_atomic};

pub const BLACKLIST_FILE_NAME: &str = "blacklisted_foreign_keys.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlacklistFile {
    /// `"{object_type}:{key_value}"` entries, sorted.
    pub blacklisted_fks: Vec<String>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub generated_at: Option<String>,
}

pub fn blacklist_path(root: &Path) -> PathBuf {
    root.join(BLACKLIST_FILE_NAME)
}

/// Loads the blacklist of a comparison root. A missing file is an empty
/// blacklist; malformed entries are skipped with a warning.
pub fn load_blacklist(root: &Path) -> Result<Blacklist> {
    let path = blacklist_path(root);
    if !path.is_file() {
        return Ok(Blacklist::new());
    }
    let text = std::fs::read_to_string(&path).map_err(|e| OrgDiffError::Read {
        path: path.clone(),
        source: e,
    })?;
    let file: BlacklistFile = serde_json::from_str(&text).map_err(|e| {
        OrgDiffError::configuration(format!("invalid blacklist {}: {e}", path.display()))
    })?;

    let (blacklist, invalid) = Blacklist::from_entries(&file.blacklisted_fks);
    for entry in &invalid {
        warn!(entry = %entry, "ignoring malformed blacklist entry");
    }
    info!(path = %path.display(), keys = blacklist.len(), "loaded blacklist");
    Ok(blacklist)
}

/// Saves `blacklist` merged with whatever the file already holds.
pub fn save_blacklist(root: &Path, blacklist: &Blacklist, writer: &dyn ContentWriter) -> Result<PathBuf> {
    let path = blacklist_path(root);
    let mut merged = load_blacklist(root).unwrap_or_else(|err| {
        warn!(error = %err, "existing blacklist unreadable, overwriting");
        Blacklist::new()
    });
    merged.extend(blacklist);

    let entries = merged.to_entries();
    let file = BlacklistFile {
        total_count: entries.len(),
        blacklisted_fks: entries,
        generated_at: Some(Utc::now().to_rfc3339()),
    };
    let json = serde_json::to_vec_pretty(&file).map_err(|e| OrgDiffError::Write {
        path: path.clone(),
        source: e.into(),
    })?;
    write_atomic(&path, &json, writer)?;
    info!(path = %path.display(), keys = file.total_count, "saved blacklist");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::FsWriter;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_blacklist(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_save_unions_with_existing_entries() {
        let dir = tempdir().unwrap();
        std::fs::write(
            blacklist_path(dir.path()),
            r#"{"blacklisted_fks": ["Account:1", "bogus"], "total_count": 2, "generated_at": "null"}"#,
        )
        .unwrap();

        let mut new_keys = Blacklist::new();
        new_keys.insert("Contact", "x@y.z");
        new_keys.insert("Account", "1");
        save_blacklist(dir.path(), &new_keys, &FsWriter).unwrap();

        let text = std::fs::read_to_string(blacklist_path(dir.path())).unwrap();
        let file: BlacklistFile = serde_json::from_str(&text).unwrap();
        assert_eq!(file.blacklisted_fks, vec!["Account:1", "Contact:x@y.z"]);
        assert_eq!(file.total_count, 2);
        assert!(file.generated_at.is_some());
    }
}
