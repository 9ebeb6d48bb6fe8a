//! Data model for multi-source record comparison.
//!
//! Sources own collections of flat records per object type. The comparison
//! engine turns disagreements between sources into [`DifferenceRecord`]s and
//! reports one [`ObjectOutcome`] per object type.

mod difference;
mod error;
mod fingerprint;
mod status;
mod value;

pub use difference::{DifferenceKind, DifferenceRecord, MISSING_MARKER, SideValue, SourceValue};
pub use error::{OrgDiffError, Result};
pub use fingerprint::{Fingerprint, FingerprintBuilder, record_fingerprint};
pub use status::{ObjectOutcome, ObjectStatus, PairStats, SkipReason};
pub use value::{FieldValue, Record, format_numeric, parse_f64};

/// Key-field configuration: object type name to identifying field name.
pub type KeyFieldMap = std::collections::BTreeMap<String, String>;

/// Format a blacklist entry as `"{object_type}:{key_value}"`.
pub fn blacklist_entry(object_type: &str, key_value: &str) -> String {
    format!("{object_type}:{key_value}")
}
