//! Human-provided resolution entries.
//!
//! A resolutions document is a JSON object keyed by
//! `"{source}:{object_type}:{key_value}"`:
//!
//! ```json
//! {
//!   "prod:Account:A-1": {"action": "keep_line", "target_line": 7, "fingerprint": "3f2a..."},
//!   "prod:Contact:x@y.z": {"action": "blacklist_key"}
//! }
//! ```
//!
//! The older `choose` / `skip` action names and the `chosen_line_number`
//! field (number or digit string) are accepted too.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use orgdiff_model::{OrgDiffError, Result};
use serde::{Deserialize, Deserializer};

/// Target of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionKey {
    pub source: String,
    pub object_type: String,
    /// May itself contain `:`.
    pub key_value: String,
}

impl ResolutionKey {
    /// Splits on the first two `:` separators.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(source), Some(object_type), Some(key_value))
                if !source.is_empty() && !object_type.is_empty() && !key_value.is_empty() =>
            {
                Ok(Self {
                    source: source.to_string(),
                    object_type: object_type.to_string(),
                    key_value: key_value.to_string(),
                })
            }
            _ => Err(OrgDiffError::resolution(
                raw,
                "expected '<source>:<object_type>:<key_value>'",
            )),
        }
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.object_type, self.key_value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ResolutionAction {
    /// Keep one record with the key and remove the other members.
    #[serde(rename = "keep_line", alias = "choose")]
    KeepLine,
    /// Exclude the key from every comparison.
    #[serde(rename = "blacklist_key", alias = "skip")]
    BlacklistKey,
}

impl ResolutionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepLine => "keep_line",
            Self::BlacklistKey => "blacklist_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resolution {
    pub action: ResolutionAction,
    #[serde(
        default,
        alias = "chosen_line_number",
        deserialize_with = "deserialize_line_number"
    )]
    pub target_line: Option<usize>,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl Resolution {
    /// Parses one entry of a resolutions document.
    pub fn from_value(key: &str, value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| OrgDiffError::resolution(key, format!("invalid resolution: {e}")))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LineNumber {
    Number(usize),
    Text(String),
}

fn deserialize_line_number<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<LineNumber> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(LineNumber::Number(n)) => Ok(Some(n)),
        Some(LineNumber::Text(text)) => {
            let text = text.trim();
            if text.is_empty() || text.eq_ignore_ascii_case("unknown") {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("'{text}' is not a line number")))
        }
    }
}

/// Raw entries of a resolutions document, keyed as in the file.
pub type ResolutionDocument = BTreeMap<String, serde_json::Value>;

/// Reads a resolutions document. Entries are validated when applied.
pub fn load_resolutions(path: &Path) -> Result<ResolutionDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| OrgDiffError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| {
        OrgDiffError::configuration(format!(
            "{} is not a JSON object of resolutions: {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_splits_on_first_two_separators() {
        let key = ResolutionKey::parse("prod:Account:urn:acme:42").unwrap();
        assert_eq!(key.source, "prod");
        assert_eq!(key.object_type, "Account");
        assert_eq!(key.key_value, "urn:acme:42");
        assert_eq!(key.to_string(), "prod:Account:urn:acme:42");

        assert!(ResolutionKey::parse("prod:Account").is_err());
        assert!(ResolutionKey::parse("prod::A").is_err());
    }

    #[test]
    fn test_current_and_legacy_forms() {
        let current = Resolution::from_value(
            "k",
            &json!({"action": "keep_line", "target_line": 7, "fingerprint": "ab"}),
        )
        .unwrap();
        assert_eq!(current.action, ResolutionAction::KeepLine);
        assert_eq!(current.target_line, Some(7));
        assert_eq!(current.fingerprint.as_deref(), Some("ab"));

        let legacy =
            Resolution::from_value("k", &json!({"action": "choose", "chosen_line_number": "12"}))
                .unwrap();
        assert_eq!(legacy.action, ResolutionAction::KeepLine);
        assert_eq!(legacy.target_line, Some(12));

        let skip = Resolution::from_value("k", &json!({"action": "skip"})).unwrap();
        assert_eq!(skip.action, ResolutionAction::BlacklistKey);
        assert_eq!(skip.target_line, None);
    }

    #[test]
    fn test_unknown_action_is_a_resolution_error() {
        let err = Resolution::from_value("k", &json!({"action": "merge"})).unwrap_err();
        assert!(matches!(err, OrgDiffError::Resolution { .. }));
        assert!(
            Resolution::from_value("k", &json!({"action": "keep_line", "target_line": "x"}))
                .is_err()
        );
    }
}
