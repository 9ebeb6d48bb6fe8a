//! Per-object-type outcome of a comparison run.

use std::fmt;

use serde::Serialize;

/// Why an object type was not compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The key-field configuration has no entry for the object type.
    NoKeyField,
    /// Fewer than two sources could provide data.
    InsufficientSources { available: usize },
    /// The run was cancelled before this object type started.
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKeyField => f.write_str("no key field configured"),
            Self::InsufficientSources { available } => {
                write!(f, "insufficient sources (found {available}, need >=2)")
            }
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Final status of one object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObjectStatus {
    Completed,
    Skipped { reason: SkipReason },
    Error { reason: String },
}

impl ObjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped { .. } => "skipped",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Human-readable reason for skipped/error statuses.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Completed => None,
            Self::Skipped { reason } => Some(reason.to_string()),
            Self::Error { reason } => Some(reason.clone()),
        }
    }
}

/// Key-level statistics for one unordered source pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairStats {
    pub left: String,
    pub right: String,
    pub common_keys: usize,
    pub left_only: usize,
    pub right_only: usize,
    /// Number of difference records emitted for this pair.
    pub differences: usize,
}

/// Outcome of comparing one object type across all sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectOutcome {
    pub object_type: String,
    pub key_field: Option<String>,
    #[serde(flatten)]
    pub status: ObjectStatus,
    /// Sources whose data took part in the comparison.
    pub sources: Vec<String>,
    /// Distinct key values across all participating sources.
    pub total_keys: usize,
    pub pairs: Vec<PairStats>,
    /// Recoverable problems (load failures, malformed or keyless records).
    pub warnings: Vec<String>,
}

impl ObjectOutcome {
    /// Outcome for an object type that never reached the comparison stage.
    pub fn skipped(
        object_type: impl Into<String>,
        key_field: Option<String>,
        reason: SkipReason,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            key_field,
            status: ObjectStatus::Skipped { reason },
            sources: Vec::new(),
            total_keys: 0,
            pairs: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Number of unordered source pairs compared.
    pub fn pair_count(&self) -> usize {
        let n = self.sources.len();
        n * n.saturating_sub(1) / 2
    }
}
