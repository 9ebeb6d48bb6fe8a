//! Set-based multi-source comparison engine.
//!
//! - [`compare`] diffs every object type across every pair of sources.
//! - [`detect`] / [`detect_all`] find duplicate keys inside one source.
//! - [`summarize`] reduces differences into per-object statistics.

mod blacklist;
mod cancel;
mod duplicates;
mod engine;
mod equality;
mod exclusion;
mod provider;
mod report;

// === Comparison ===
pub use engine::{CompareInput, CompareOutcome, compare, compare_pair};
pub use equality::{EngineOptions, classify, values_equal};

// === Inputs ===
pub use blacklist::Blacklist;
pub use cancel::CancelFlag;
pub use exclusion::{DEFAULT_EXCLUDED_FIELDS, ExclusionPolicy};
pub use provider::{DirectoryProvider, LoadedRecords, MemoryProvider, RecordProvider};

// === Duplicates ===
pub use duplicates::{
    DuplicateGroup, DuplicateMember, DuplicateReport, DuplicateScan, FieldDiff, MemberDiff,
    ObjectDuplicates, ScanSummary, SourceDuplicates, detect, detect_all,
};

// === Reporting ===
pub use report::{ComparisonSummary, FieldSummary, KindCounts, ObjectSummary, Totals, summarize};
