use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use orgdiff_core::{CompareOutcome, ComparisonSummary};

/// Everything `compare` produced, for printing.
#[derive(Debug)]
pub struct CompareRunResult {
    pub output_dir: PathBuf,
    pub sources: Vec<String>,
    pub display_names: BTreeMap<String, String>,
    pub excluded_fields: BTreeSet<String>,
    pub blacklisted_keys: usize,
    pub outcome: CompareOutcome,
    pub summary: ComparisonSummary,
    pub output_files: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl CompareRunResult {
    pub fn has_errors(&self) -> bool {
        self.outcome.has_errors()
    }
}
