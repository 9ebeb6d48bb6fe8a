//! Serializers for comparison results.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use orgdiff_core::ComparisonSummary;
use orgdiff_model::{DifferenceRecord, ObjectOutcome};
use serde::Serialize;
use tracing::info;

pub const DIFFERENCES_CSV: &str = "all_differences.csv";
pub const DIFFERENCES_JSON: &str = "differences.json";
pub const SUMMARY_JSON: &str = "comparison_summary.json";
pub const DUPLICATE_REPORT_JSON: &str = "duplicate_fk_report.json";

const BASE_COLUMNS: [&str; 4] = [
    "ForeignKeyField",
    "ForeignKeyValue",
    "ObjectFieldName",
    "DifferenceType",
];

/// Column name for a source's values.
pub fn source_column(source: &str) -> String {
    format!("Org_{source}")
}

/// Writes one CSV row per difference record.
///
/// Every source of the run gets an `Org_<source>` column; only the two
/// sources of a record's pair are filled in.
pub fn write_differences_csv<W: Write>(
    writer: W,
    differences: &[DifferenceRecord],
    sources: &[String],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<String> = BASE_COLUMNS.iter().map(ToString::to_string).collect();
    header.extend(sources.iter().map(|source| source_column(source)));
    wtr.write_record(&header).context("write csv header")?;

    for diff in differences {
        let mut row = vec![
            diff.key_field.clone(),
            diff.key_value.clone(),
            diff.qualified_field(),
            diff.kind.to_string(),
        ];
        row.extend(sources.iter().map(|source| {
            diff.value_for(source)
                .map(|value| value.display_text())
                .unwrap_or_default()
        }));
        wtr.write_record(&row).context("write csv row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub timestamp: String,
    pub execution_time_seconds: f64,
    pub total_differences: usize,
    pub organizations: &'a [String],
    pub display_names: BTreeMap<&'a str, &'a str>,
    pub objects_processed: Vec<&'a str>,
    pub excluded_fields: &'a BTreeSet<String>,
    pub blacklisted_keys: usize,
    pub statuses: &'a [ObjectOutcome],
    pub summary: &'a ComparisonSummary,
    pub output_files: Vec<PathBuf>,
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).context("serialize json")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

pub fn write_csv_file(path: &Path, differences: &[DifferenceRecord], sources: &[String]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_differences_csv(std::io::BufWriter::new(file), differences, sources)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = differences.len(), "wrote differences");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_has_one_column_per_source() {
        let mut out = Vec::new();
        write_differences_csv(&mut out, &[], &["a".to_string(), "b".to_string()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.trim_end(),
            "ForeignKeyField,ForeignKeyValue,ObjectFieldName,DifferenceType,Org_a,Org_b"
        );
    }
}
