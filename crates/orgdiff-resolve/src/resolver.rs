//! Batch application of resolutions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use orgdiff_core::Blacklist;
use orgdiff_ingest::{SourceFormat, find_config_file, load_config};
use orgdiff_model::{KeyFieldMap, OrgDiffError, Result, blacklist_entry};
use serde::Serialize;
use tracing::{error, info, info_span, warn};

use crate::atomic::{ContentWriter, FsWriter, write_atomic};
use crate::blacklist_file::save_blacklist;
use crate::keep_line::{KeepLine, KeepOutcome, keep_lines};
use crate::resolution::{Resolution, ResolutionAction, ResolutionDocument, ResolutionKey};

pub const RESOLUTION_SUMMARY_FILE_NAME: &str = "resolution_summary.json";

/// A validated `keep_line` entry waiting for its collection's rewrite.
struct PendingKeep<'a> {
    raw_key: &'a str,
    key_field: &'a str,
    target_line: usize,
    key: ResolutionKey,
    fingerprint: Option<String>,
}

#[derive(Debug, Default)]
pub struct ResolutionSummary {
    pub total_resolutions: usize,
    /// Successful `keep_line` resolutions, including already-resolved keys.
    pub resolved_count: usize,
    /// Successful `blacklist_key` resolutions.
    pub blacklisted_count: usize,
    pub records_removed: usize,
    pub failures: Vec<OrgDiffError>,
}

impl ResolutionSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    total_resolutions: usize,
    resolved_count: usize,
    blacklisted_count: usize,
    records_removed: usize,
    blacklisted_fks: Vec<String>,
    failures: Vec<String>,
    processed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    blacklist_file: Option<&'a Path>,
}

/// Applies resolutions under one comparison root.
pub struct Resolver {
    root: PathBuf,
    key_fields: KeyFieldMap,
    writer: Box<dyn ContentWriter>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>, key_fields: KeyFieldMap) -> Self {
        Self {
            root: root.into(),
            key_fields,
            writer: Box::new(FsWriter),
        }
    }

    /// Replaces the writer used for every file this resolver produces.
    #[must_use]
    pub fn with_writer(mut self, writer: impl ContentWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    /// Checks a `keep_line` entry and locates the JSONL collection it edits.
    fn locate_keep<'a>(
        &'a self,
        raw_key: &str,
        key: &ResolutionKey,
        resolution: &Resolution,
    ) -> Result<(&'a str, usize, PathBuf)> {
        let key_field = self.key_fields.get(&key.object_type).ok_or_else(|| {
            OrgDiffError::resolution(raw_key, format!("no key field configured for {}", key.object_type))
        })?;
        let target_line = resolution
            .target_line
            .ok_or_else(|| OrgDiffError::resolution(raw_key, "keep_line requires a target line"))?;

        let dir = self.root.join(&key.source);
        let jsonl = SourceFormat::Jsonl.path_in(&dir, &key.object_type);
        if !jsonl.is_file() {
            return Err(OrgDiffError::resolution(
                raw_key,
                format!("no JSONL collection at {}", jsonl.display()),
            ));
        }
        Ok((key_field.as_str(), target_line, jsonl))
    }

    /// Applies every entry, collecting failures, then persists the blacklist
    /// and the resolution summary.
    ///
    /// `keep_line` entries are grouped per collection and applied in one
    /// rewrite, so every target line refers to the file as it was reviewed.
    pub fn apply(&self, resolutions: &ResolutionDocument, blacklist: &mut Blacklist) -> ResolutionSummary {
        let mut summary = ResolutionSummary {
            total_resolutions: resolutions.len(),
            ..ResolutionSummary::default()
        };
        let mut pending: BTreeMap<PathBuf, Vec<PendingKeep<'_>>> = BTreeMap::new();

        for (raw_key, value) in resolutions {
            let span = info_span!("resolve", key = %raw_key);
            let _guard = span.enter();
            let parsed = ResolutionKey::parse(raw_key)
                .and_then(|key| Resolution::from_value(raw_key, value).map(|resolution| (key, resolution)));
            let (key, resolution) = match parsed {
                Ok(parsed) => parsed,
                Err(err) => {
                    error!(error = %err, "resolution failed");
                    summary.failures.push(err);
                    continue;
                }
            };
            info!(action = resolution.action.as_str(), "applying resolution");

            match resolution.action {
                ResolutionAction::BlacklistKey => {
                    let added = blacklist.insert(key.object_type.as_str(), key.key_value.as_str());
                    info!(entry = %blacklist_entry(&key.object_type, &key.key_value), added, "blacklisted key");
                    summary.blacklisted_count += 1;
                }
                ResolutionAction::KeepLine => match self.locate_keep(raw_key, &key, &resolution) {
                    Ok((key_field, target_line, jsonl)) => {
                        pending.entry(jsonl).or_default().push(PendingKeep {
                            raw_key,
                            key_field,
                            target_line,
                            key,
                            fingerprint: resolution.fingerprint,
                        });
                    }
                    Err(err) => {
                        error!(error = %err, "resolution failed");
                        summary.failures.push(err);
                    }
                },
            }
        }

        for (jsonl, entries) in &pending {
            self.keep_in_file(jsonl, entries, &mut summary);
        }

        let blacklist_file = match save_blacklist(&self.root, blacklist, self.writer.as_ref()) {
            Ok(path) => Some(path),
            Err(err) => {
                error!(error = %err, "could not save blacklist");
                summary.failures.push(err);
                None
            }
        };
        if let Err(err) = self.write_summary(&summary, blacklist, blacklist_file.as_deref()) {
            error!(error = %err, "could not save resolution summary");
            summary.failures.push(err);
        }

        info!(
            total = summary.total_resolutions,
            resolved = summary.resolved_count,
            blacklisted = summary.blacklisted_count,
            removed = summary.records_removed,
            failures = summary.failures.len(),
            "resolution complete"
        );
        summary
    }

    fn keep_in_file(&self, jsonl: &Path, entries: &[PendingKeep<'_>], summary: &mut ResolutionSummary) {
        let span = info_span!("keep_lines", path = %jsonl.display(), entries = entries.len());
        let _guard = span.enter();
        let requests: Vec<KeepLine<'_>> = entries
            .iter()
            .map(|entry| KeepLine {
                label: entry.raw_key,
                key_field: entry.key_field,
                key_value: &entry.key.key_value,
                target_line: entry.target_line,
                fingerprint: entry.fingerprint.as_deref(),
            })
            .collect();

        let mut rewritten = false;
        for result in keep_lines(jsonl, &requests, self.writer.as_ref()) {
            match result {
                Ok(outcome) => {
                    summary.resolved_count += 1;
                    if let KeepOutcome::Rewritten { removed } = outcome {
                        summary.records_removed += removed;
                        rewritten = true;
                    }
                }
                Err(err) => {
                    error!(error = %err, "resolution failed");
                    summary.failures.push(err);
                }
            }
        }

        if rewritten {
            let parquet = jsonl.with_extension(SourceFormat::Parquet.extension());
            if parquet.exists() {
                match std::fs::remove_file(&parquet) {
                    Ok(()) => info!(path = %parquet.display(), "removed stale parquet cache"),
                    Err(e) => warn!(path = %parquet.display(), error = %e, "could not remove parquet cache"),
                }
            }
        }
    }

    fn write_summary(
        &self,
        summary: &ResolutionSummary,
        blacklist: &Blacklist,
        blacklist_file: Option<&Path>,
    ) -> Result<()> {
        let path = self.root.join(RESOLUTION_SUMMARY_FILE_NAME);
        let file = SummaryFile {
            total_resolutions: summary.total_resolutions,
            resolved_count: summary.resolved_count,
            blacklisted_count: summary.blacklisted_count,
            records_removed: summary.records_removed,
            blacklisted_fks: blacklist.to_entries(),
            failures: summary.failures.iter().map(ToString::to_string).collect(),
            processed_at: Utc::now().to_rfc3339(),
            blacklist_file,
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| OrgDiffError::Write {
            path: path.clone(),
            source: e.into(),
        })?;
        write_atomic(&path, &json, self.writer.as_ref())
    }
}

/// Applies `resolutions` under `root`, reading key fields from the root's
/// configuration file. `blacklist` receives the newly blacklisted keys.
pub fn apply(root: &Path, resolutions: &ResolutionDocument, blacklist: &mut Blacklist) -> Result<ResolutionSummary> {
    let config_path = find_config_file(root)?
        .ok_or_else(|| OrgDiffError::configuration(format!("no config_*.json in {}", root.display())))?;
    let config = load_config(&config_path)?;
    let resolver = Resolver::new(root, config.key_field_map());
    Ok(resolver.apply(resolutions, blacklist))
}
