//! Where the engine gets its records from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use orgdiff_ingest::load_records;
use orgdiff_model::{OrgDiffError, Record, Result};

/// Records of one (source, object type) plus recoverable load warnings.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    pub warnings: Vec<String>,
}

/// Supplies the records of one (source, object type) collection.
pub trait RecordProvider {
    /// Fails with [`OrgDiffError::Load`] when the collection cannot be read.
    fn load(&self, source: &str, object_type: &str) -> Result<LoadedRecords>;
}

/// Reads collections from `<root>/<source>/<Object>.{parquet,jsonl,csv}`.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RecordProvider for DirectoryProvider {
    fn load(&self, source: &str, object_type: &str) -> Result<LoadedRecords> {
        let loaded = load_records(&self.root.join(source), object_type)
            .map_err(|err| err.into_load_error(source, object_type))?;
        Ok(LoadedRecords {
            records: loaded.records,
            warnings: loaded.warnings,
        })
    }
}

/// In-memory collections, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    collections: BTreeMap<(String, String), Vec<Record>>,
    failures: BTreeMap<(String, String), String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection. Records are numbered by position.
    #[must_use]
    pub fn with(
        mut self,
        source: impl Into<String>,
        object_type: impl Into<String>,
        records: Vec<Record>,
    ) -> Self {
        self.insert(source, object_type, records);
        self
    }

    pub fn insert(
        &mut self,
        source: impl Into<String>,
        object_type: impl Into<String>,
        mut records: Vec<Record>,
    ) {
        for (idx, record) in records.iter_mut().enumerate() {
            if record.line_number == 0 {
                record.line_number = idx + 1;
            }
        }
        self.collections
            .insert((source.into(), object_type.into()), records);
    }

    /// Makes loading (source, object type) fail with `message`.
    #[must_use]
    pub fn with_failure(
        mut self,
        source: impl Into<String>,
        object_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures
            .insert((source.into(), object_type.into()), message.into());
        self
    }
}

impl RecordProvider for MemoryProvider {
    fn load(&self, source: &str, object_type: &str) -> Result<LoadedRecords> {
        let key = (source.to_string(), object_type.to_string());
        if let Some(message) = self.failures.get(&key) {
            return Err(OrgDiffError::load(source, object_type, message.clone()));
        }
        match self.collections.get(&key) {
            Some(records) => Ok(LoadedRecords {
                records: records.clone(),
                warnings: Vec::new(),
            }),
            None => Err(OrgDiffError::load(source, object_type, "no data")),
        }
    }
}
