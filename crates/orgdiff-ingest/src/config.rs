//! Key-field configuration (`config_*.json`).
//!
//! ```json
//! {
//!   "objects": { "Account": { "foreignKey": "External_Id__c" } },
//!   "orgs": [ { "username": "admin@acme.com", "alias": "Production" } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use orgdiff_model::KeyFieldMap;
use serde::Deserialize;

use crate::error::{IngestError, Result};

const CONFIG_PREFIX: &str = "config_";
const CONFIG_SUFFIX: &str = ".json";

/// Parsed configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectConfig>,
    #[serde(default)]
    pub orgs: Vec<OrgEntry>,
}

/// Per-object settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectConfig {
    #[serde(rename = "foreignKey", default)]
    pub foreign_key: Option<String>,
}

/// A configured source, identified by the username its folder is named after.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgEntry {
    pub username: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ComparisonConfig {
    /// Object type → key field, skipping entries whose key is blank.
    pub fn key_field_map(&self) -> KeyFieldMap {
        self.objects
            .iter()
            .filter_map(|(object, cfg)| {
                let key = cfg.foreign_key.as_deref()?.trim();
                (!key.is_empty()).then(|| (object.clone(), key.to_string()))
            })
            .collect()
    }

    /// Folder name → display name (alias, or the username itself).
    pub fn display_names(&self) -> BTreeMap<String, String> {
        self.orgs
            .iter()
            .filter(|org| !org.username.trim().is_empty())
            .map(|org| {
                let display = org
                    .alias
                    .as_deref()
                    .filter(|alias| !alias.trim().is_empty())
                    .unwrap_or(&org.username);
                (folder_name(&org.username), display.to_string())
            })
            .collect()
    }
}

/// Folder name for a username: `@` and `.` become `_`.
pub fn folder_name(username: &str) -> String {
    username.replace(['@', '.'], "_")
}

/// First `config_*.json` file in `root`, by file name.
pub fn find_config_file(root: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|e| IngestError::DirectoryRead {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut candidates = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_config = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(CONFIG_PREFIX) && name.ends_with(CONFIG_SUFFIX));
        if is_config && path.is_file() {
            candidates.push(path);
        }
    }

    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(candidates.into_iter().next())
}

/// Parse a configuration file.
pub fn load_config(path: &Path) -> Result<ComparisonConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| IngestError::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
