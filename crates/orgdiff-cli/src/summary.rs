use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use orgdiff_core::{DuplicateScan, ObjectSummary};
use orgdiff_ingest::Discovery;
use orgdiff_resolve::ResolutionSummary;

use crate::types::CompareRunResult;

pub fn print_discovery(discovery: &Discovery) {
    println!("Root: {}", discovery.root.display());
    if let Some(path) = &discovery.config_path {
        println!("Config: {}", path.display());
    }
    let sources: Vec<String> = discovery
        .sources
        .iter()
        .map(|source| match discovery.display_names.get(source) {
            Some(name) if name != source => format!("{source} ({name})"),
            _ => source.clone(),
        })
        .collect();
    println!("Sources: {}", sources.join(", "));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Object"),
        header_cell("Key Field"),
        header_cell("Sources"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for object in &discovery.common_object_types {
        let key_field = discovery.key_field(object);
        table.add_row(vec![
            object_cell(object),
            key_field.map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(discovery.sources.len()),
            match key_field {
                Some(_) => Cell::new("compare").fg(Color::Green),
                None => Cell::new("no key field").fg(Color::Yellow),
            },
        ]);
    }
    for (object, present_in) in &discovery.partial_object_types {
        table.add_row(vec![
            object_cell(object),
            discovery.key_field(object).map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(present_in.len()),
            dim_cell("partial"),
        ]);
    }
    println!("{table}");
}

pub fn print_duplicates(scan: &DuplicateScan) {
    if !scan.has_duplicates() {
        println!("No duplicate keys found.");
    } else {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Source"),
            header_cell("Object"),
            header_cell("Key Field"),
            header_cell("Duplicate Keys"),
            header_cell("Records"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 3, CellAlignment::Right);
        align_column(&mut table, 4, CellAlignment::Right);
        for (source, duplicates) in &scan.duplicates {
            for (object, found) in &duplicates.objects {
                let records: usize = found.duplicates.values().map(|g| g.record_count).sum();
                table.add_row(vec![
                    Cell::new(source),
                    object_cell(object),
                    Cell::new(&found.foreign_key_field),
                    count_cell(found.duplicate_count, Color::Red),
                    Cell::new(records),
                ]);
            }
        }
        println!("{table}");
        println!(
            "{} duplicate key(s) in {} object type(s) across {} source(s) require resolution.",
            scan.summary.total_duplicate_fks,
            scan.summary.total_objects_with_duplicates,
            scan.summary.total_orgs_with_duplicates
        );
    }
    print_errors(&scan.errors);
}

pub fn print_resolution(summary: &ResolutionSummary) {
    println!("Resolutions: {}", summary.total_resolutions);
    println!("Kept records: {}", summary.resolved_count);
    println!("Records removed: {}", summary.records_removed);
    println!("Blacklisted keys: {}", summary.blacklisted_count);
    let failures: Vec<String> = summary.failures.iter().map(ToString::to_string).collect();
    print_errors(&failures);
}

pub fn print_comparison(result: &CompareRunResult) {
    println!("Output: {}", result.output_dir.display());
    let sources: Vec<String> = result
        .sources
        .iter()
        .map(|source| match result.display_names.get(source) {
            Some(name) if name != source => format!("{source} ({name})"),
            _ => source.clone(),
        })
        .collect();
    println!(
        "Sources: {} | Excluded fields: {} | Blacklisted keys: {}",
        sources.join(", "),
        result.excluded_fields.len(),
        result.blacklisted_keys
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Object"),
        header_cell("Status"),
        header_cell("Sources"),
        header_cell("Keys"),
        header_cell("Differing Keys"),
        header_cell("Missing"),
        header_cell("Null"),
        header_cell("Value"),
        header_cell("Consistency"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=8 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for object in result.summary.objects.values() {
        let counts = &object.difference_counts;
        table.add_row(vec![
            object_cell(&object.object_type),
            status_cell(object),
            Cell::new(object.sources.len()),
            Cell::new(object.total_keys),
            count_cell(object.differing_keys, Color::Yellow),
            count_cell(counts.record_missing, Color::Red),
            count_cell(counts.null_value_difference, Color::Yellow),
            count_cell(counts.value_difference, Color::Yellow),
            consistency_cell(object),
        ]);
    }
    let totals = &result.summary.totals;
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} ok / {} skipped / {} error",
            totals.objects_compared, totals.objects_skipped, totals.objects_errored
        ))
        .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(totals.difference_counts.record_missing, Color::Red).add_attribute(Attribute::Bold),
        count_cell(totals.difference_counts.null_value_difference, Color::Yellow)
            .add_attribute(Attribute::Bold),
        count_cell(totals.difference_counts.value_difference, Color::Yellow)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    println!(
        "{} difference(s) in {:.2}s",
        totals.total_differences,
        result.elapsed.as_secs_f64()
    );

    let notes: Vec<String> = result
        .summary
        .objects
        .values()
        .filter_map(|object| {
            object
                .reason
                .as_ref()
                .map(|reason| format!("{}: {reason}", object.object_type))
        })
        .collect();
    if !notes.is_empty() {
        eprintln!("Not compared:");
        for note in &notes {
            eprintln!("- {note}");
        }
    }
    for path in &result.output_files {
        println!("Wrote {}", path.display());
    }
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Errors:");
    for error in errors {
        eprintln!("- {error}");
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(150);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(object: &ObjectSummary) -> Cell {
    match object.status.as_str() {
        "completed" => Cell::new("completed").fg(Color::Green),
        "skipped" => Cell::new("skipped").fg(Color::Yellow),
        other => Cell::new(other)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn consistency_cell(object: &ObjectSummary) -> Cell {
    if object.status != "completed" {
        return dim_cell("-");
    }
    let score = object.consistency_score;
    let color = if score >= 100.0 {
        Color::Green
    } else if score >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{score:.2}%")).fg(color)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn object_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
