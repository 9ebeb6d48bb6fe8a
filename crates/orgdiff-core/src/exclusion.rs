//! Fields that never take part in a comparison.

use std::collections::BTreeSet;

/// Audit and system fields that always differ between sources.
pub const DEFAULT_EXCLUDED_FIELDS: [&str; 10] = [
    "CreatedDate",
    "CreatedBy",
    "CreatedById",
    "CreatedBy_Name",
    "LastModifiedDate",
    "LastModifiedBy",
    "LastModifiedById",
    "LastModifiedBy_Name",
    "SystemModstamp",
    "Id",
];

/// Built-in exclusions plus caller additions. Names match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPolicy {
    additional: BTreeSet<String>,
}

impl ExclusionPolicy {
    pub fn new<I, S>(additional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            additional: additional
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.trim().is_empty())
                .collect(),
        }
    }

    /// The union of defaults and additions, identical for every object type.
    pub fn effective_exclusions(&self) -> BTreeSet<String> {
        DEFAULT_EXCLUDED_FIELDS
            .iter()
            .map(ToString::to_string)
            .chain(self.additional.iter().cloned())
            .collect()
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        DEFAULT_EXCLUDED_FIELDS.contains(&field) || self.additional.contains(field)
    }
}
