//! JSON and Markdown output files.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use budget_model::{CheckResult, Finding, ValidationReport};
use serde::Serialize;

use crate::pipeline::{FileOutcome, FileStatus};

/// Output path `<dir>/<file stem>.<suffix>`.
pub fn output_path(dir: &Path, outcome: &FileOutcome, suffix: &str) -> PathBuf {
    let stem = outcome
        .path
        .file_stem()
        .map_or_else(|| outcome.dataset.clone(), |s| s.to_string_lossy().into_owned());
    dir.join(format!("{stem}.{suffix}"))
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

/// Write reconstructed records (or the diagnostics of a structural failure).
pub fn write_records_json(dir: &Path, outcome: &FileOutcome) -> Result<Option<PathBuf>> {
    match &outcome.status {
        FileStatus::Parsed(parsed) => {
            let path = output_path(dir, outcome, "records.json");
            write_json(&path, &parsed.table)?;
            Ok(Some(path))
        }
        FileStatus::Structural { diagnostics, .. } => {
            let path = output_path(dir, outcome, "diagnostics.json");
            write_json(&path, &**diagnostics)?;
            Ok(Some(path))
        }
        FileStatus::Unreadable(_) => Ok(None),
    }
}

pub fn write_report_json(dir: &Path, outcome: &FileOutcome) -> Result<Option<PathBuf>> {
    let Some(report) = outcome.report() else {
        return Ok(None);
    };
    let path = output_path(dir, outcome, "report.json");
    write_json(&path, report)?;
    Ok(Some(path))
}

pub fn write_markdown(dir: &Path, outcome: &FileOutcome) -> Result<Option<PathBuf>> {
    let Some(report) = outcome.report() else {
        return Ok(None);
    };
    let path = output_path(dir, outcome, "report.md");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    fs::write(&path, render_markdown(report))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(Some(path))
}

/// Render a validation report as a Markdown document.
pub fn render_markdown(report: &ValidationReport) -> String {
    let mut out = String::new();
    let meta = &report.metadata;
    let summary = &report.summary;

    let _ = writeln!(out, "# Validation report: {}", meta.dataset);
    let _ = writeln!(out);
    let _ = writeln!(out, "- Source: {} ({})", meta.source_type.description(), meta.source_type);
    if let Some(year) = meta.year {
        let _ = writeln!(out, "- Year: {year}");
    }
    let _ = writeln!(out, "- Records: {}", meta.record_count);
    let _ = writeln!(out, "- Generated: {}", meta.generated_at.to_rfc3339());
    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Checks | Passed | With warnings | With errors |");
    let _ = writeln!(out, "|---:|---:|---:|---:|");
    let _ = writeln!(
        out,
        "| {} | {} | {} | {} |",
        summary.total_checks, summary.passed, summary.with_warnings, summary.with_errors
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Checks");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Check | Severity | Status | Failures |");
    let _ = writeln!(out, "|---|---|---|---:|");
    for result in &report.results {
        let status = if result.passed { "pass" } else { "fail" };
        let _ = writeln!(
            out,
            "| `{}` | {} | {status} | {} |",
            result.check,
            result.severity.label(),
            result.failures.len()
        );
    }

    let failing: Vec<&CheckResult> = report.results.iter().filter(|r| !r.passed).collect();
    if failing.is_empty() {
        return out;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Findings");
    for result in failing {
        let _ = writeln!(out);
        let _ = writeln!(out, "### `{}` ({})", result.check, result.severity.label());
        let _ = writeln!(out);
        let _ = writeln!(out, "| Severity | Level | Entity | Line | Field | Message |");
        let _ = writeln!(out, "|---|---|---|---:|---|---|");
        for finding in &result.failures {
            let _ = writeln!(out, "{}", finding_row(finding));
        }
    }
    out
}

fn finding_row(finding: &Finding) -> String {
    let line = finding
        .line
        .map_or_else(|| "-".to_string(), |line| line.to_string());
    format!(
        "| {} | {} | {} | {line} | {} | {} |",
        finding.severity.label(),
        finding.level,
        escape_cell(&finding.entity),
        finding.field.as_deref().unwrap_or("-"),
        escape_cell(&finding.message)
    )
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use budget_model::{HierarchyLevel, Severity};

    use super::*;

    #[test]
    fn finding_rows_carry_their_own_severity() {
        let finding = Finding::new(
            Severity::Warning,
            HierarchyLevel::Subprogram,
            "101 Salud / 16 Atención / 01 Vacunación",
            "execution_pct has no value",
        )
        .at_line(Some(3));
        let row = finding_row(&finding);
        assert!(row.starts_with(&format!("| {} |", Severity::Warning.label())), "{row}");
        assert!(row.contains("| 3 |"), "{row}");
    }

    #[test]
    fn pipes_are_escaped_in_cells() {
        assert_eq!(escape_cell("a | b"), "a \\| b");
    }
}
