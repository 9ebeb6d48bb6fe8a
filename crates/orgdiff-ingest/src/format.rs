//! Collection file formats and their lookup order.

use std::fmt;
use std::path::{Path, PathBuf};

/// On-disk format of one object type's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceFormat {
    Parquet,
    Jsonl,
    Csv,
}

impl SourceFormat {
    /// Order used when loading records for comparison (fastest first).
    pub const COMPARISON_ORDER: [SourceFormat; 3] =
        [SourceFormat::Parquet, SourceFormat::Jsonl, SourceFormat::Csv];

    /// Order used when line positions matter (duplicate detection and
    /// resolution). JSONL lines are the physical records resolutions refer to.
    pub const POSITIONAL_ORDER: [SourceFormat; 3] =
        [SourceFormat::Jsonl, SourceFormat::Csv, SourceFormat::Parquet];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
        }
    }

    /// Parse a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("parquet") {
            Some(Self::Parquet)
        } else if ext.eq_ignore_ascii_case("jsonl") {
            Some(Self::Jsonl)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }

    /// `<dir>/<object_type>.<ext>`.
    pub fn path_in(self, dir: &Path, object_type: &str) -> PathBuf {
        dir.join(format!("{object_type}.{}", self.extension()))
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Splits a data file name into (object type, format).
///
/// Backup (`.backup`), temporary (`.tmp`) and hidden files yield `None`.
pub fn classify_file_name(name: &str) -> Option<(String, SourceFormat)> {
    if name.starts_with('.') {
        return None;
    }
    let (stem, ext) = name.rsplit_once('.')?;
    let format = SourceFormat::from_extension(ext)?;
    if stem.is_empty() {
        return None;
    }
    Some((stem.to_string(), format))
}

/// First existing collection file for `object_type` in `order`.
pub fn locate(dir: &Path, object_type: &str, order: &[SourceFormat]) -> Option<(PathBuf, SourceFormat)> {
    order.iter().find_map(|format| {
        let path = format.path_in(dir, object_type);
        path.is_file().then_some((path, *format))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_file_name() {
        assert_eq!(
            classify_file_name("Account.jsonl"),
            Some(("Account".to_string(), SourceFormat::Jsonl))
        );
        assert_eq!(
            classify_file_name("SBQQ__Quote__c.PARQUET"),
            Some(("SBQQ__Quote__c".to_string(), SourceFormat::Parquet))
        );
        assert_eq!(classify_file_name("Account.jsonl.backup"), None);
        assert_eq!(classify_file_name("Account.jsonl.tmp"), None);
        assert_eq!(classify_file_name(".Account.csv"), None);
        assert_eq!(classify_file_name("notes.txt"), None);
    }

    #[test]
    fn test_locate_prefers_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Account.csv"), "Id\n1\n").unwrap();
        std::fs::write(dir.path().join("Account.jsonl"), "{}\n").unwrap();

        let (_, format) = locate(dir.path(), "Account", &SourceFormat::COMPARISON_ORDER).unwrap();
        assert_eq!(format, SourceFormat::Jsonl);

        let (_, format) =
            locate(dir.path(), "Account", &[SourceFormat::Csv, SourceFormat::Jsonl]).unwrap();
        assert_eq!(format, SourceFormat::Csv);

        assert!(locate(dir.path(), "Contact", &SourceFormat::COMPARISON_ORDER).is_none());
    }
}
