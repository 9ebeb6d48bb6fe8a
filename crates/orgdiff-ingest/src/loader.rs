//! Record loading for parquet, JSONL and CSV collections.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use orgdiff_model::{FieldValue, OrgDiffError, Record};
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::format::{SourceFormat, locate};
use crate::polars_utils::{dataframe_to_records, records_to_dataframe};

/// Records of one (source, object type) collection.
#[derive(Debug, Clone)]
pub struct LoadedCollection {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub records: Vec<Record>,
    /// Recoverable problems (malformed lines, cache failures).
    pub warnings: Vec<String>,
}

/// Parses one JSONL line into a record.
///
/// Returns `Ok(None)` for blank lines. Lines that are not JSON objects are
/// parse errors.
pub fn parse_jsonl_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> std::result::Result<Option<Record>, OrgDiffError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parse_error = |message: String| OrgDiffError::Parse {
        path: path.to_path_buf(),
        line: line_number,
        message,
    };
    let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|e| parse_error(e.to_string()))?;
    let serde_json::Value::Object(map) = value else {
        return Err(parse_error("line is not a JSON object".to_string()));
    };

    let mut record = Record::new(line_number);
    for (field, value) in &map {
        record
            .fields
            .insert(field.clone(), FieldValue::from_json(value));
    }
    Ok(Some(record))
}

/// Reads a JSONL file. Malformed lines are skipped and returned as errors.
///
/// Record line numbers are physical, 1-based line numbers.
pub fn read_jsonl(path: &Path) -> Result<(Vec<Record>, Vec<OrgDiffError>)> {
    let file = File::open(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        match parse_jsonl_line(path, idx + 1, &line) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err) => {
                warn!(path = %path.display(), line = idx + 1, error = %err, "skipping malformed record");
                errors.push(err);
            }
        }
    }
    Ok((records, errors))
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads a CSV file with a header row. Empty cells become null.
pub fn read_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .iter()
        .map(normalize_header)
        .collect();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut record = Record::new(idx + 1);
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            record.fields.insert(header.clone(), FieldValue::text(cell));
        }
        records.push(record);
    }
    Ok(records)
}

/// Reads a parquet file.
pub fn read_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let df = ParquetReader::new(file).finish()?;
    Ok(dataframe_to_records(&df))
}

/// Writes `records` as a parquet file, going through a `.tmp` sibling.
pub fn write_parquet(path: &Path, records: &[Record]) -> Result<()> {
    let mut df = records_to_dataframe(records)?;
    let tmp_path = tmp_sibling(path);
    let mut file = File::create(&tmp_path).map_err(|e| IngestError::FileWrite {
        path: tmp_path.clone(),
        source: e,
    })?;
    if let Err(err) = ParquetWriter::new(&mut file).finish(&mut df) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    drop(file);
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        IngestError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// A parquet file next to a JSONL file is only trusted when it is not older.
fn cache_is_fresh(parquet: &Path, jsonl: &Path) -> bool {
    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(parquet), modified(jsonl)) {
        (Some(cache), Some(source)) => cache >= source,
        (Some(_), None) => true,
        _ => false,
    }
}

fn read_format(path: &Path, format: SourceFormat) -> Result<(Vec<Record>, Vec<String>)> {
    match format {
        SourceFormat::Parquet => Ok((read_parquet(path)?, Vec::new())),
        SourceFormat::Csv => Ok((read_csv(path)?, Vec::new())),
        SourceFormat::Jsonl => {
            let (records, errors) = read_jsonl(path)?;
            Ok((records, errors.iter().map(ToString::to_string).collect()))
        }
    }
}

/// Loads a collection for comparison: parquet, then JSONL, then CSV.
///
/// A parquet file older than its JSONL sibling is treated as a stale cache
/// and the JSONL is read instead. After a clean JSONL load the parquet cache
/// is (re)written; failing to write it is only a warning.
pub fn load_records(dir: &Path, object_type: &str) -> Result<LoadedCollection> {
    let jsonl = SourceFormat::Jsonl.path_in(dir, object_type);
    let parquet = SourceFormat::Parquet.path_in(dir, object_type);

    let (path, format) = match locate(dir, object_type, &SourceFormat::COMPARISON_ORDER) {
        Some((_, SourceFormat::Parquet)) if jsonl.is_file() && !cache_is_fresh(&parquet, &jsonl) => {
            debug!(path = %parquet.display(), "parquet cache is stale");
            (jsonl.clone(), SourceFormat::Jsonl)
        }
        Some(found) => found,
        None => {
            return Err(IngestError::NoDataFile {
                dir: dir.to_path_buf(),
                object_type: object_type.to_string(),
            });
        }
    };

    let (records, mut warnings) = read_format(&path, format)?;
    debug!(
        path = %path.display(),
        format = %format,
        records = records.len(),
        "loaded collection"
    );

    if format == SourceFormat::Jsonl && warnings.is_empty() && !records.is_empty() {
        match write_parquet(&parquet, &records) {
            Ok(()) => info!(path = %parquet.display(), "created parquet cache"),
            Err(err) => {
                warn!(path = %parquet.display(), error = %err, "could not create parquet cache");
                warnings.push(format!("could not create parquet cache: {err}"));
            }
        }
    }

    Ok(LoadedCollection {
        path,
        format,
        records,
        warnings,
    })
}

/// Loads a collection where record positions matter: JSONL, then CSV, then
/// parquet. Never writes a cache.
pub fn load_records_positional(dir: &Path, object_type: &str) -> Result<LoadedCollection> {
    let Some((path, format)) = locate(dir, object_type, &SourceFormat::POSITIONAL_ORDER) else {
        return Err(IngestError::NoDataFile {
            dir: dir.to_path_buf(),
            object_type: object_type.to_string(),
        });
    };
    let (records, warnings) = read_format(&path, format)?;
    Ok(LoadedCollection {
        path,
        format,
        records,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jsonl_line() {
        let path = Path::new("Account.jsonl");
        let record = parse_jsonl_line(path, 3, r#"{"Id": "a", "Amount": 2}"#)
            .unwrap()
            .unwrap();
        assert_eq!(record.line_number, 3);
        assert_eq!(record.get("Amount"), Some(&FieldValue::Int(2)));

        assert!(parse_jsonl_line(path, 4, "   ").unwrap().is_none());
        assert!(matches!(
            parse_jsonl_line(path, 5, "[1, 2]"),
            Err(OrgDiffError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_read_csv_blank_cells_are_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Account.csv");
        std::fs::write(&path, "\u{feff}Id,Name,Phone\n1,Acme,\n2,,555\n").unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Id"), Some(&FieldValue::text("1")));
        assert_eq!(records[0].get("Phone"), Some(&FieldValue::Null));
        assert_eq!(records[1].get("Name"), Some(&FieldValue::Null));
        assert_eq!(records[1].line_number, 2);
    }

    #[test]
    fn test_tmp_sibling() {
        assert_eq!(
            tmp_sibling(Path::new("/data/org/Account.parquet")),
            PathBuf::from("/data/org/Account.parquet.tmp")
        );
    }
}
