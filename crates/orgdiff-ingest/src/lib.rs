//! Source discovery, key-field configuration and record loading.

mod config;
mod discovery;
mod error;
mod format;
mod loader;
pub mod polars_utils;

// === Configuration ===
pub use config::{
    ComparisonConfig, ObjectConfig, OrgEntry, find_config_file, folder_name, load_config,
};

// === Discovery ===
pub use discovery::{
    Discovery, IGNORED_DIRECTORIES, discover, list_object_types, list_sources,
};

// === Errors ===
pub use error::{IngestError, Result};

// === Formats ===
pub use format::{SourceFormat, classify_file_name, locate};

// === Loading ===
pub use loader::{
    LoadedCollection, load_records, load_records_positional, parse_jsonl_line, read_csv,
    read_jsonl, read_parquet, write_parquet,
};
