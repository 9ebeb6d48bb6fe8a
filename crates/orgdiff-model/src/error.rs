//! Error taxonomy shared by every orgdiff crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by discovery, loading, resolution and persistence.
///
/// Only [`OrgDiffError::Configuration`] is fatal to a comparison run; every
/// other variant is recovered at the object-type, record or resolution level
/// and reported alongside the results.
#[derive(Debug, Error)]
pub enum OrgDiffError {
    // === Run-level ===
    /// Fewer than two sources, or no key-field mapping at all.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    // === Object-level ===
    /// A source's collection for one object type could not be read.
    #[error("failed to load {object_type} for source '{source_name}': {message}")]
    Load {
        source_name: String,
        object_type: String,
        message: String,
    },

    // === Record-level ===
    /// A single record could not be parsed.
    #[error("malformed record in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    // === Resolution ===
    /// A resolution entry was malformed or could not be applied.
    #[error("cannot apply resolution '{key}': {message}")]
    Resolution { key: String, message: String },

    /// Persisting resolved data failed; the original content was restored.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file or directory failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OrgDiffError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn load(
        source_name: impl Into<String>,
        object_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Load {
            source_name: source_name.into(),
            object_type: object_type.into(),
            message: message.into(),
        }
    }

    pub fn resolution(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True when the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result type for orgdiff operations.
pub type Result<T> = std::result::Result<T, OrgDiffError>;
