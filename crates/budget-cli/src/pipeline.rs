//! Per-file pipeline: read, reconstruct, validate.
//!
//! Files are independent. [`process_files`] runs one scoped worker per file
//! and returns outcomes in input order; nothing is shared between workers
//! except the immutable configuration.

use std::path::{Path, PathBuf};
use std::thread;

use budget_model::{LedgerConfig, SourceType, ValidationReport};
use budget_parse::{
    ParseDiagnostics, ParseError, ParsedTable, StructuralFailure, WorksheetOptions, parse_rows,
    read_worksheet,
};
use budget_validate::{ValidationInput, validate};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info_span, trace, warn};

use crate::logging::redact_value;

/// Settings shared by every file of one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub source: SourceType,
    /// Fiscal year; inferred from each file name when absent.
    pub year: Option<u16>,
    pub worksheet: WorksheetOptions,
    /// Run the checks after reconstruction.
    pub validate: bool,
    pub generated_at: DateTime<Utc>,
}

/// A file that was reconstructed, with its report when checks ran.
#[derive(Debug)]
pub struct ParsedFile {
    pub table: ParsedTable,
    pub report: Option<ValidationReport>,
}

#[derive(Debug)]
pub enum FileStatus {
    Parsed(Box<ParsedFile>),
    /// The worksheet was read but its hierarchy could not be rebuilt.
    Structural {
        reason: StructuralFailure,
        diagnostics: Box<ParseDiagnostics>,
    },
    /// The file could not be opened or decoded.
    Unreadable(String),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Dataset identity used in reports (the file name).
    pub dataset: String,
    pub year: Option<u16>,
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn parsed(&self) -> Option<&ParsedFile> {
        match &self.status {
            FileStatus::Parsed(parsed) => Some(&**parsed),
            FileStatus::Structural { .. } | FileStatus::Unreadable(_) => None,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.parsed().and_then(|parsed| parsed.report.as_ref())
    }

    pub fn has_errors(&self) -> bool {
        self.report().is_some_and(ValidationReport::has_errors)
    }
}

/// Process exit code for a run.
///
/// 2 when any report carries an Error finding; otherwise 1 when there was
/// nothing to validate or some file produced no data; otherwise 0.
/// Warnings never change the code.
pub fn exit_code_for(outcomes: &[FileOutcome]) -> i32 {
    if outcomes.iter().any(FileOutcome::has_errors) {
        2
    } else if outcomes.is_empty() || outcomes.iter().any(|o| o.parsed().is_none()) {
        1
    } else {
        0
    }
}

/// First plausible fiscal year in a file name, e.g. `ley_2019_v2.csv`.
pub fn infer_year(path: &Path) -> Option<u16> {
    let stem = path.file_stem()?.to_string_lossy();
    stem.split(|ch: char| !ch.is_ascii_digit())
        .filter(|run| run.len() == 4)
        .filter_map(|run| run.parse::<u16>().ok())
        .find(|year| (1990..=2100).contains(year))
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Read, reconstruct and optionally validate one worksheet.
pub fn process_file(path: &Path, options: &RunOptions, config: &LedgerConfig) -> FileOutcome {
    let dataset = dataset_name(path);
    let year = options.year.or_else(|| infer_year(path));
    let span = info_span!("file", dataset = %dataset, source = %options.source);
    let _guard = span.enter();

    let status = match read_and_parse(path, options, year, config) {
        Ok(table) => {
            log_anomalies(&table.diagnostics);
            let report = options.validate.then(|| {
                let input = ValidationInput::new(
                    table.source_type,
                    table.year,
                    &table.records,
                    &table.summary,
                );
                validate(&input, config, &dataset, options.generated_at)
            });
            FileStatus::Parsed(Box::new(ParsedFile { table, report }))
        }
        Err(ParseError::Structural {
            reason,
            diagnostics,
        }) => {
            warn!(%reason, rows = diagnostics.rows_seen, "no data to validate");
            log_anomalies(&diagnostics);
            FileStatus::Structural {
                reason,
                diagnostics,
            }
        }
        Err(err) => {
            error!(error = %err, "worksheet unreadable");
            FileStatus::Unreadable(err.to_string())
        }
    };

    FileOutcome {
        path: path.to_path_buf(),
        dataset,
        year,
        status,
    }
}

fn read_and_parse(
    path: &Path,
    options: &RunOptions,
    year: Option<u16>,
    config: &LedgerConfig,
) -> budget_parse::Result<ParsedTable> {
    let rows = read_worksheet(path, options.worksheet)?;
    debug!(rows = rows.len(), "worksheet loaded");
    parse_rows(&rows, options.source, year, config)
}

fn log_anomalies(diagnostics: &ParseDiagnostics) {
    for anomaly in &diagnostics.anomalies {
        trace!(
            line = anomaly.line,
            kind = %anomaly.kind,
            cells = redact_value(&anomaly.cells.join(" | ")),
            "anomalous row"
        );
    }
}

/// Process every file on its own scoped thread; outcomes keep input order.
pub fn process_files(
    paths: &[PathBuf],
    options: &RunOptions,
    config: &LedgerConfig,
) -> Vec<FileOutcome> {
    thread::scope(|scope| {
        let workers: Vec<_> = paths
            .iter()
            .map(|path| (path, scope.spawn(move || process_file(path, options, config))))
            .collect();
        workers
            .into_iter()
            .map(|(path, worker)| {
                worker.join().unwrap_or_else(|_| FileOutcome {
                    path: path.clone(),
                    dataset: dataset_name(path),
                    year: options.year,
                    status: FileStatus::Unreadable("worker panicked".to_string()),
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_year_from_file_name() {
        assert_eq!(infer_year(Path::new("data/ley_2019_v2.csv")), Some(2019));
        assert_eq!(infer_year(Path::new("ejecucion-1t-2023.csv")), Some(2023));
        assert_eq!(infer_year(Path::new("plan_12345.csv")), None);
        assert_eq!(infer_year(Path::new("budget.csv")), None);
    }

    #[test]
    fn empty_run_has_no_data() {
        assert_eq!(exit_code_for(&[]), 1);
    }
}
