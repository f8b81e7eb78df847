use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use budget_cli::pipeline::{FileOutcome, FileStatus};
use budget_model::{CheckId, Finding, Severity};

/// Print the per-file table, then findings and structural diagnostics.
pub fn print_summary(outcomes: &[FileOutcome]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Source"),
        header_cell("Year"),
        header_cell("Records"),
        header_cell("Anomalies"),
        header_cell("Status"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    align_column(&mut table, 6, CellAlignment::Right);
    align_column(&mut table, 7, CellAlignment::Right);

    let mut total_records = 0usize;
    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;
    for outcome in outcomes {
        let (errors, warnings) = match outcome.report() {
            Some(report) => (Some(report.error_count()), Some(report.warning_count())),
            None => (None, None),
        };
        total_errors += errors.unwrap_or(0);
        total_warnings += warnings.unwrap_or(0);
        let (source, records, anomalies) = match &outcome.status {
            FileStatus::Parsed(parsed) => {
                total_records += parsed.table.records.len();
                (
                    Cell::new(parsed.table.source_type.code()),
                    Cell::new(parsed.table.records.len()),
                    count_cell(Some(parsed.table.diagnostics.anomalies.len()), Color::Yellow),
                )
            }
            FileStatus::Structural { diagnostics, .. } => (
                dim_cell("-"),
                dim_cell(0),
                count_cell(Some(diagnostics.anomalies.len()), Color::Yellow),
            ),
            FileStatus::Unreadable(_) => (dim_cell("-"), dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![
            Cell::new(&outcome.dataset)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            source,
            outcome.year.map_or_else(|| dim_cell("-"), Cell::new),
            records,
            anomalies,
            status_cell(outcome),
            count_cell(errors, Color::Red),
            count_cell(warnings, Color::Yellow),
        ]);
    }
    if outcomes.len() > 1 {
        table.add_row(vec![
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new(total_records).add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
            count_cell(Some(total_errors), Color::Red).add_attribute(Attribute::Bold),
            count_cell(Some(total_warnings), Color::Yellow).add_attribute(Attribute::Bold),
        ]);
    }
    println!("{table}");
    print_finding_table(outcomes);
    print_failures(outcomes);
}

fn print_finding_table(outcomes: &[FileOutcome]) {
    let mut findings: Vec<(&str, CheckId, &Finding)> = outcomes
        .iter()
        .filter_map(|outcome| outcome.report().map(|report| (outcome, report)))
        .flat_map(|(outcome, report)| {
            report
                .findings()
                .map(move |(check, finding)| (outcome.dataset.as_str(), check, finding))
        })
        .collect();
    if findings.is_empty() {
        return;
    }
    // Errors first; within a severity keep file and check order.
    findings.sort_by_key(|(_, _, finding)| finding.severity);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Severity"),
        header_cell("Check"),
        header_cell("Level"),
        header_cell("Line"),
        header_cell("Entity"),
        header_cell("Field"),
        header_cell("Message"),
    ]);
    apply_finding_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for (dataset, check, finding) in findings {
        table.add_row(vec![
            Cell::new(dataset),
            severity_cell(finding.severity),
            Cell::new(check),
            Cell::new(finding.level),
            finding.line.map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&finding.entity),
            finding
                .field
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&finding.message),
        ]);
    }
    println!();
    println!("Findings:");
    println!("{table}");
}

fn print_failures(outcomes: &[FileOutcome]) {
    for outcome in outcomes {
        match &outcome.status {
            FileStatus::Parsed(_) => {}
            FileStatus::Structural {
                reason,
                diagnostics,
            } => {
                eprintln!(
                    "{}: {reason} ({} rows read, {} org units, {} programs)",
                    outcome.dataset,
                    diagnostics.rows_seen,
                    diagnostics.org_unit_blocks,
                    diagnostics.program_blocks
                );
                for anomaly in &diagnostics.anomalies {
                    eprintln!("  line {}: {}", anomaly.line, anomaly.message);
                }
            }
            FileStatus::Unreadable(error) => {
                eprintln!("{}: {error}", outcome.dataset);
            }
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if table.column_count() >= 4 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Percentage(45)),
        ]);
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() >= 8 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
            ColumnConstraint::UpperBoundary(Width::Fixed(14)),
            ColumnConstraint::LowerBoundary(Width::Fixed(4)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(9)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
        ]);
    }
}

fn apply_finding_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(200);
    if table.column_count() >= 8 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Fixed(22)),
            ColumnConstraint::UpperBoundary(Width::Fixed(11)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::UpperBoundary(Width::Fixed(18)),
            ColumnConstraint::UpperBoundary(Width::Percentage(45)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(outcome: &FileOutcome) -> Cell {
    match &outcome.status {
        FileStatus::Parsed(_) if outcome.has_errors() => Cell::new("errors")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        FileStatus::Parsed(parsed) if parsed.report.is_none() => {
            Cell::new("parsed").fg(Color::Green)
        }
        FileStatus::Parsed(_) => Cell::new("ok")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        FileStatus::Structural { .. } => Cell::new("no data").fg(Color::Yellow),
        FileStatus::Unreadable(_) => Cell::new("unreadable").fg(Color::Red),
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR").fg(Color::Red),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
