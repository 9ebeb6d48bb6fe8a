//! Error types for source discovery and record loading.

use std::path::PathBuf;

use orgdiff_model::OrgDiffError;
use thiserror::Error;

/// Errors that can occur while discovering or reading sources.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Root directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No collection file exists for the object type.
    #[error("no data file for {object_type} in {dir}")]
    NoDataFile { dir: PathBuf, object_type: String },

    // === Configuration Errors ===
    /// The key-field configuration file is not valid JSON.
    #[error("invalid configuration {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Fewer than two sources, or no key-field mapping.
    #[error("{message}")]
    Configuration { message: String },

    // === Parsing Errors ===
    /// Failed to parse a CSV file.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed DataFrame operation (parquet read/write).
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl IngestError {
    /// Attach the (source, object type) a load failure belongs to.
    pub fn into_load_error(self, source_name: &str, object_type: &str) -> OrgDiffError {
        OrgDiffError::load(source_name, object_type, self.to_string())
    }
}

impl From<IngestError> for OrgDiffError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Configuration { message } => OrgDiffError::Configuration { message },
            IngestError::DirectoryRead { path, source } | IngestError::FileRead { path, source } => {
                OrgDiffError::Read { path, source }
            }
            IngestError::FileWrite { path, source } => OrgDiffError::Write { path, source },
            IngestError::NoDataFile { ref dir, ref object_type } => {
                let source_name = dir
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let object_type = object_type.clone();
                err.into_load_error(&source_name, &object_type)
            }
            other => OrgDiffError::Configuration {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
