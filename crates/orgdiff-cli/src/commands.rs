use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use orgdiff_cli::export::{
    ComparisonReport, DIFFERENCES_CSV, DIFFERENCES_JSON, DUPLICATE_REPORT_JSON, SUMMARY_JSON,
    write_csv_file, write_json,
};
use orgdiff_cli::logging::redact_value;
use orgdiff_core::{
    Blacklist, CompareInput, DirectoryProvider, DuplicateScan, EngineOptions, ExclusionPolicy,
    compare, detect_all, summarize,
};
use orgdiff_ingest::{Discovery, discover};
use orgdiff_model::DifferenceRecord;
use orgdiff_resolve::{ResolutionSummary, Resolver, load_blacklist, load_resolutions};
use tracing::{Level, enabled, info, info_span, trace, warn};

use crate::cli::{CompareArgs, DiscoverArgs, DuplicatesArgs, ResolveArgs};
use crate::types::CompareRunResult;

pub fn run_discover(args: &DiscoverArgs) -> Result<Discovery> {
    discover(&args.root).with_context(|| format!("discover sources in {}", args.root.display()))
}

pub fn run_duplicates(args: &DuplicatesArgs) -> Result<(DuplicateScan, PathBuf)> {
    let span = info_span!("duplicates", root = %args.root.display());
    let _guard = span.enter();
    let discovery = run_discover(&DiscoverArgs {
        root: args.root.clone(),
    })?;
    let scan = detect_all(&discovery);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.root.join(DUPLICATE_REPORT_JSON));
    write_json(&output, &scan)?;
    Ok((scan, output))
}

pub fn run_resolve(args: &ResolveArgs) -> Result<ResolutionSummary> {
    let span = info_span!("resolve", root = %args.root.display());
    let _guard = span.enter();
    let discovery = run_discover(&DiscoverArgs {
        root: args.root.clone(),
    })?;
    let resolutions = load_resolutions(&args.resolutions)
        .with_context(|| format!("read resolutions {}", args.resolutions.display()))?;
    let mut blacklist = load_blacklist(&args.root).context("load blacklist")?;

    let resolver = Resolver::new(&args.root, discovery.key_field_map.clone());
    Ok(resolver.apply(&resolutions, &mut blacklist))
}

fn select_sources(discovery: &Discovery, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(discovery.sources.clone());
    }
    for source in requested {
        if !discovery.sources.contains(source) {
            bail!("unknown source '{source}' (found: {})", discovery.sources.join(", "));
        }
    }
    let mut sources = requested.to_vec();
    sources.sort();
    sources.dedup();
    if sources.len() < 2 {
        bail!("at least two sources are required, got {}", sources.len());
    }
    Ok(sources)
}

fn select_objects(discovery: &Discovery, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return discovery.common_object_types.clone();
    }
    for object in requested {
        if !discovery.common_object_types.contains(object) {
            warn!(object = %object, "object type is not present in every source");
        }
    }
    requested.to_vec()
}

fn engine_options(args: &CompareArgs) -> EngineOptions {
    let defaults = EngineOptions::default();
    EngineOptions {
        rtol: args.rtol.unwrap_or(defaults.rtol),
        atol: args.atol.unwrap_or(defaults.atol),
    }
}

fn trace_differences(differences: &[DifferenceRecord]) {
    if !enabled!(Level::TRACE) {
        return;
    }
    for diff in differences {
        let left = diff.left.value.display_text();
        let right = diff.right.value.display_text();
        trace!(
            object = %diff.object_type,
            key = redact_value(&diff.key_value),
            field = %diff.field,
            kind = %diff.kind,
            left = redact_value(&left),
            right = redact_value(&right),
            "difference"
        );
    }
}

pub fn run_compare(args: &CompareArgs) -> Result<CompareRunResult> {
    let started = Instant::now();
    let span = info_span!("compare_run", root = %args.root.display());
    let _guard = span.enter();

    let discovery = run_discover(&DiscoverArgs {
        root: args.root.clone(),
    })?;
    let sources = select_sources(&discovery, &args.sources)?;
    let object_types = select_objects(&discovery, &args.objects);
    if !discovery.partial_object_types.is_empty() {
        info!(
            objects = ?discovery.partial_object_types.keys().collect::<Vec<_>>(),
            "object types missing from some sources are not compared"
        );
    }

    let exclusions = ExclusionPolicy::new(args.exclude_fields.iter().cloned()).effective_exclusions();
    let blacklist = if args.no_blacklist {
        Blacklist::new()
    } else {
        load_blacklist(&args.root).context("load blacklist")?
    };
    let blacklisted_keys = blacklist.len();
    let input = CompareInput::new(discovery.key_field_map.clone())
        .with_exclusions(exclusions.clone())
        .with_blacklist(blacklist)
        .with_options(engine_options(args));

    let provider = DirectoryProvider::new(&args.root);
    let outcome = compare(&input, &provider, &sources, &object_types);
    trace_differences(&outcome.differences);
    let summary = summarize(&outcome.differences, &outcome.outcomes);

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.root.join("comparison_results"));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;

    let mut output_files = Vec::new();
    if args.format.wants_csv() {
        let path = output_dir.join(DIFFERENCES_CSV);
        write_csv_file(&path, &outcome.differences, &sources)?;
        output_files.push(path);
    }
    if args.format.wants_json() {
        let path = output_dir.join(DIFFERENCES_JSON);
        write_json(&path, &outcome.differences)?;
        output_files.push(path);
    }
    let summary_path = output_dir.join(SUMMARY_JSON);
    output_files.push(summary_path.clone());

    let display_names: BTreeMap<&str, &str> = sources
        .iter()
        .map(|source| (source.as_str(), discovery.display_name(source)))
        .collect();
    let objects_processed: Vec<&str> = outcome
        .outcomes
        .iter()
        .filter(|o| o.status.is_completed())
        .map(|o| o.object_type.as_str())
        .collect();
    let elapsed = started.elapsed();
    let report = ComparisonReport {
        timestamp: Utc::now().to_rfc3339(),
        execution_time_seconds: elapsed.as_secs_f64(),
        total_differences: outcome.differences.len(),
        organizations: &sources,
        display_names,
        objects_processed,
        excluded_fields: &exclusions,
        blacklisted_keys,
        statuses: &outcome.outcomes,
        summary: &summary,
        output_files: output_files.clone(),
    };
    write_json(&summary_path, &report)?;

    info!(
        objects = outcome.outcomes.len(),
        differences = outcome.differences.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "comparison complete"
    );
    let display_names = discovery.display_names.clone();
    Ok(CompareRunResult {
        output_dir,
        sources,
        display_names,
        excluded_fields: exclusions,
        blacklisted_keys,
        outcome,
        summary,
        output_files,
        elapsed,
    })
}
