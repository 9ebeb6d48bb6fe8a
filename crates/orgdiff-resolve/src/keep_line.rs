//! Keep-one-record rewrite of a JSONL collection.

use std::collections::BTreeSet;
use std::path::Path;

use orgdiff_ingest::parse_jsonl_line;
use orgdiff_model::{OrgDiffError, Record, Result, record_fingerprint};
use tracing::{debug, info};

use crate::atomic::{ContentWriter, replace_with_backup};

/// Which record to keep among the members of one key.
#[derive(Debug, Clone, Copy)]
pub struct KeepLine<'a> {
    /// Label used in errors, usually the resolution key.
    pub label: &'a str,
    pub key_field: &'a str,
    pub key_value: &'a str,
    /// 1-based physical line number in the file as reviewed.
    pub target_line: usize,
    /// Expected hex fingerprint of the record at `target_line`.
    pub fingerprint: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepOutcome {
    /// Other members were removed and the file was replaced.
    Rewritten { removed: usize },
    /// Only one record carries the key; nothing was removed for it.
    AlreadyResolved,
}

struct Member {
    line_number: usize,
    fingerprint: String,
}

/// Lines a validated request removes, or `None` when its key is already unique.
type Plan = Option<Vec<usize>>;

fn fingerprint_matches(expected: Option<&str>, actual: &str) -> bool {
    expected.is_none_or(|expected| expected.trim().eq_ignore_ascii_case(actual))
}

fn members_of(records: &[Option<Record>], request: &KeepLine<'_>) -> Vec<Member> {
    records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let record = record.as_ref()?;
            (record.key_value(request.key_field).as_deref() == Some(request.key_value)).then(|| Member {
                line_number: idx + 1,
                fingerprint: record_fingerprint(record).to_hex(),
            })
        })
        .collect()
}

fn plan(path: &Path, records: &[Option<Record>], request: &KeepLine<'_>) -> Result<Plan> {
    let members = members_of(records, request);
    debug!(
        key = request.key_value,
        lines = ?members.iter().map(|m| m.line_number).collect::<Vec<_>>(),
        "located key members"
    );

    match members.as_slice() {
        [] => {
            return Err(OrgDiffError::resolution(
                request.label,
                format!("no record with {} = '{}' in {}", request.key_field, request.key_value, path.display()),
            ));
        }
        [only] => {
            if !fingerprint_matches(request.fingerprint, &only.fingerprint) {
                return Err(OrgDiffError::resolution(
                    request.label,
                    format!("record at line {} does not match the expected fingerprint", only.line_number),
                ));
            }
            info!(key = request.key_value, line = only.line_number, "key already unique");
            return Ok(None);
        }
        _ => {}
    }

    let Some(target) = members.iter().find(|m| m.line_number == request.target_line) else {
        return Err(OrgDiffError::resolution(
            request.label,
            format!(
                "line {} does not hold a record with {} = '{}'",
                request.target_line, request.key_field, request.key_value
            ),
        ));
    };
    if !fingerprint_matches(request.fingerprint, &target.fingerprint) {
        return Err(OrgDiffError::resolution(
            request.label,
            format!(
                "record at line {} changed since it was reviewed (fingerprint mismatch)",
                request.target_line
            ),
        ));
    }
    Ok(Some(
        members
            .iter()
            .map(|m| m.line_number)
            .filter(|&line| line != target.line_number)
            .collect(),
    ))
}

fn not_applied(request: &KeepLine<'_>, path: &Path) -> OrgDiffError {
    OrgDiffError::resolution(
        request.label,
        format!("not applied because {} could not be rewritten", path.display()),
    )
}

/// Applies every request against one JSONL collection in a single rewrite.
///
/// Target lines refer to the file as it is before the call. For each key
/// the record at its target line is kept and the other members are dropped;
/// all other lines are written back verbatim. Returns one result per request,
/// in order. When the file cannot be read or replaced, the first affected
/// request carries the I/O error and the others a resolution error.
pub fn keep_lines(
    path: &Path,
    requests: &[KeepLine<'_>],
    writer: &dyn ContentWriter,
) -> Vec<Result<KeepOutcome>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            let mut results = Vec::with_capacity(requests.len());
            let mut first = Some(OrgDiffError::Read {
                path: path.to_path_buf(),
                source: e,
            });
            for request in requests {
                results.push(Err(first.take().unwrap_or_else(|| not_applied(request, path))));
            }
            return results;
        }
    };
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    // Unparsable lines are never members.
    let records: Vec<Option<Record>> = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| parse_jsonl_line(path, idx + 1, line).ok().flatten())
        .collect();

    let plans: Vec<Result<Plan>> = requests
        .iter()
        .map(|request| plan(path, &records, request))
        .collect();
    let dropped: BTreeSet<usize> = plans
        .iter()
        .filter_map(|plan| plan.as_ref().ok().and_then(Option::as_ref))
        .flatten()
        .copied()
        .collect();

    let mut write_error = None;
    if !dropped.is_empty() {
        let mut content = String::with_capacity(text.len());
        for (idx, line) in lines.iter().enumerate() {
            if !dropped.contains(&(idx + 1)) {
                content.push_str(line);
            }
        }
        match replace_with_backup(path, content.as_bytes(), writer) {
            Ok(()) => info!(path = %path.display(), removed = dropped.len(), "duplicate records removed"),
            Err(err) => write_error = Some(err),
        }
    }

    let failed = write_error.is_some();
    requests
        .iter()
        .zip(plans)
        .map(|(request, plan)| match plan? {
            None => Ok(KeepOutcome::AlreadyResolved),
            Some(_) if failed => Err(write_error.take().unwrap_or_else(|| not_applied(request, path))),
            Some(removed) => Ok(KeepOutcome::Rewritten {
                removed: removed.len(),
            }),
        })
        .collect()
}
