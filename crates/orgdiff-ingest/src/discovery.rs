//! Source and object type discovery.
//!
//! Every visible subdirectory of the root is a source. A source holds one
//! collection file per object type (`<Object>.parquet|jsonl|csv`).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use orgdiff_model::KeyFieldMap;
use tracing::{debug, info};

use crate::config::{find_config_file, load_config};
use crate::error::{IngestError, Result};
use crate::format::{SourceFormat, classify_file_name};

/// Directory names that never hold source data.
pub const IGNORED_DIRECTORIES: [&str; 6] = [
    ".buffers",
    "comparison_results",
    "results",
    "output",
    "temp",
    "tmp",
];

/// Result of scanning a comparison root.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub root: PathBuf,
    /// Source names, sorted.
    pub sources: Vec<String>,
    /// Object types present in every source, sorted.
    pub common_object_types: Vec<String>,
    /// Object types present in some sources only, with those sources.
    pub partial_object_types: BTreeMap<String, Vec<String>>,
    /// Common object types that have no configured key field.
    pub unkeyed_object_types: Vec<String>,
    pub key_field_map: KeyFieldMap,
    /// Source folder → display name from the configuration.
    pub display_names: BTreeMap<String, String>,
    pub config_path: Option<PathBuf>,
}

impl Discovery {
    /// Common object types that have a key field, sorted.
    pub fn comparable_object_types(&self) -> Vec<String> {
        self.common_object_types
            .iter()
            .filter(|object| self.key_field_map.contains_key(*object))
            .cloned()
            .collect()
    }

    pub fn key_field(&self, object_type: &str) -> Option<&str> {
        self.key_field_map.get(object_type).map(String::as_str)
    }

    /// Display name of a source, falling back to its folder name.
    pub fn display_name<'a>(&'a self, source: &'a str) -> &'a str {
        self.display_names
            .get(source)
            .map_or(source, String::as_str)
    }

    pub fn source_dir(&self, source: &str) -> PathBuf {
        self.root.join(source)
    }
}

fn is_ignored_directory(name: &str) -> bool {
    name.starts_with('.') || IGNORED_DIRECTORIES.contains(&name)
}

/// Lists source directories under `root`, sorted by name.
pub fn list_sources(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(root).map_err(|e| IngestError::DirectoryRead {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut sources = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_ignored_directory(name) {
            debug!(directory = name, "skipping non-source directory");
            continue;
        }
        sources.push(name.to_string());
    }

    sources.sort();
    Ok(sources)
}

/// Object types with at least one collection file in `dir`, and their formats.
pub fn list_object_types(dir: &Path) -> Result<BTreeMap<String, BTreeSet<SourceFormat>>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut objects: BTreeMap<String, BTreeSet<SourceFormat>> = BTreeMap::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((object, format)) = classify_file_name(name) {
            objects.entry(object).or_default().insert(format);
        }
    }
    Ok(objects)
}

/// Scans `root` for sources, object types and the key-field configuration.
///
/// Fails with a configuration error when fewer than two sources exist or no
/// key-field mapping is available.
pub fn discover(root: &Path) -> Result<Discovery> {
    let sources = list_sources(root)?;
    if sources.len() < 2 {
        return Err(IngestError::Configuration {
            message: format!(
                "need at least 2 sources under {}, found {}",
                root.display(),
                sources.len()
            ),
        });
    }

    let config_path = find_config_file(root)?;
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => {
            return Err(IngestError::Configuration {
                message: format!("no config_*.json with key fields in {}", root.display()),
            });
        }
    };
    let key_field_map = config.key_field_map();
    if key_field_map.is_empty() {
        return Err(IngestError::Configuration {
            message: "configuration defines no key fields".to_string(),
        });
    }

    let mut presence: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for source in &sources {
        for object in list_object_types(&root.join(source))?.into_keys() {
            presence.entry(object).or_default().push(source.clone());
        }
    }

    let mut common_object_types = Vec::new();
    let mut partial_object_types = BTreeMap::new();
    for (object, present_in) in presence {
        if present_in.len() == sources.len() {
            common_object_types.push(object);
        } else {
            partial_object_types.insert(object, present_in);
        }
    }

    let unkeyed_object_types = common_object_types
        .iter()
        .filter(|object| !key_field_map.contains_key(*object))
        .cloned()
        .collect::<Vec<_>>();

    info!(
        root = %root.display(),
        sources = sources.len(),
        common_objects = common_object_types.len(),
        partial_objects = partial_object_types.len(),
        unkeyed_objects = unkeyed_object_types.len(),
        "discovery complete"
    );

    Ok(Discovery {
        root: root.to_path_buf(),
        sources,
        common_object_types,
        partial_object_types,
        unkeyed_object_types,
        key_field_map,
        display_names: config.display_names(),
        config_path,
    })
}
