//! Blacklisted (object type, key value) pairs.

use std::collections::BTreeSet;

use orgdiff_model::blacklist_entry;

/// Keys excluded from every comparison, everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    entries: BTreeSet<(String, String)>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a blacklist from `"{object_type}:{key_value}"` strings.
    ///
    /// Entries without a separator are returned separately.
    pub fn from_entries<I, S>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blacklist = Self::new();
        let mut invalid = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            match parse_entry(entry) {
                Some((object_type, key_value)) => {
                    blacklist.insert(object_type, key_value);
                }
                None => invalid.push(entry.to_string()),
            }
        }
        (blacklist, invalid)
    }

    /// Returns true when the pair was not present yet.
    pub fn insert(&mut self, object_type: impl Into<String>, key_value: impl Into<String>) -> bool {
        self.entries.insert((object_type.into(), key_value.into()))
    }

    pub fn contains(&self, object_type: &str, key_value: &str) -> bool {
        self.entries
            .contains(&(object_type.to_string(), key_value.to_string()))
    }

    /// Adds every entry of `other`.
    pub fn extend(&mut self, other: &Blacklist) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(object, key)| (object.as_str(), key.as_str()))
    }

    /// Sorted `"{object_type}:{key_value}"` strings.
    pub fn to_entries(&self) -> Vec<String> {
        self.iter()
            .map(|(object, key)| blacklist_entry(object, key))
            .collect()
    }
}

/// Splits `"{object_type}:{key_value}"` on the first separator.
fn parse_entry(entry: &str) -> Option<(&str, &str)> {
    let (object_type, key_value) = entry.split_once(':')?;
    if object_type.is_empty() || key_value.is_empty() {
        return None;
    }
    Some((object_type, key_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_dedupes_and_keeps_colons_in_keys() {
        let (blacklist, invalid) =
            Blacklist::from_entries(["Account:A-1", "Account:A-1", "Quote:Q:7", "garbage"]);
        assert_eq!(blacklist.len(), 2);
        assert!(blacklist.contains("Quote", "Q:7"));
        assert_eq!(invalid, vec!["garbage".to_string()]);
        assert_eq!(blacklist.to_entries(), vec!["Account:A-1", "Quote:Q:7"]);
    }

    #[test]
    fn test_insert_reports_novelty() {
        let mut blacklist = Blacklist::new();
        assert!(blacklist.insert("Account", "A-1"));
        assert!(!blacklist.insert("Account", "A-1"));
    }
}
