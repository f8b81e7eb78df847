//! End-to-end runs over CSV worksheets on disk.

use std::fs;
use std::path::{Path, PathBuf};

use budget_cli::render::{write_markdown, write_records_json, write_report_json};
use budget_cli::{FileStatus, RunOptions, exit_code_for, process_files};
use budget_model::{CheckId, LedgerConfig, SourceType};
use budget_parse::{StructuralFailure, WorksheetOptions};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

const CLEAN_LAW: &str = "\
Entidad 101,Ministerio de Salud,,,1000
Programa 16,Atencion primaria,,600,
01,Vacunas,400,,
02,Consultas,200,,
Programa 17,Hospitales,,400,
01,Equipamiento,400,,
Entidad 102,Ministerio de Educacion,,,500
Programa 20,Escuelas,,500,
01,Obras,300,,
02,Becas,200,,
TOTAL GENERAL,,,,1500
";

fn options(validate: bool) -> RunOptions {
    RunOptions {
        source: SourceType::AnnualLaw,
        year: None,
        worksheet: WorksheetOptions::default(),
        validate,
        generated_at: Utc
            .with_ymd_and_hms(2024, 7, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

fn write_sheet(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write worksheet");
    path
}

fn run(paths: &[PathBuf]) -> Vec<budget_cli::FileOutcome> {
    process_files(paths, &options(true), &LedgerConfig::default())
}

#[test]
fn clean_worksheet_exits_zero() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_sheet(dir.path(), "ley_2024.csv", CLEAN_LAW);

    let outcomes = run(&[path]);
    assert_eq!(exit_code_for(&outcomes), 0);
    let outcome = &outcomes[0];
    assert_eq!(outcome.dataset, "ley_2024.csv");
    assert_eq!(outcome.year, Some(2024));
    let report = outcome.report().expect("report");
    assert_eq!(report.metadata.year, Some(2024));
    assert_eq!(report.metadata.record_count, 5);
    assert_eq!(report.error_count(), 0);
}

#[test]
fn total_mismatch_exits_two() {
    let dir = TempDir::new().expect("temp dir");
    let sheet = CLEAN_LAW.replace("Ministerio de Salud,,,1000", "Ministerio de Salud,,,950");
    let path = write_sheet(dir.path(), "ley_2024.csv", &sheet);

    let outcomes = run(&[path]);
    assert_eq!(exit_code_for(&outcomes), 2);
    let report = outcomes[0].report().expect("report");
    assert!(!report.check_passed(CheckId::HierarchicalTotals));
}

#[test]
fn missing_grand_total_exits_one() {
    let dir = TempDir::new().expect("temp dir");
    let sheet = CLEAN_LAW.replace("TOTAL GENERAL,,,,1500\n", "");
    let path = write_sheet(dir.path(), "ley_2024.csv", &sheet);

    let outcomes = run(&[path]);
    assert_eq!(exit_code_for(&outcomes), 1);
    match &outcomes[0].status {
        FileStatus::Structural {
            reason,
            diagnostics,
        } => {
            assert_eq!(*reason, StructuralFailure::MissingGrandTotal);
            assert_eq!(diagnostics.org_unit_blocks, 2);
        }
        other => panic!("expected structural failure, got {other:?}"),
    }
}

#[test]
fn unreadable_file_does_not_hide_other_results() {
    let dir = TempDir::new().expect("temp dir");
    let clean = write_sheet(dir.path(), "ley_2024.csv", CLEAN_LAW);
    let missing = dir.path().join("ley_2023.csv");

    let outcomes = run(&[missing.clone(), clean]);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].path, missing);
    assert!(matches!(outcomes[0].status, FileStatus::Unreadable(_)));
    assert!(outcomes[1].report().is_some());
    assert_eq!(exit_code_for(&outcomes), 1);
}

#[test]
fn errors_outrank_missing_data() {
    let dir = TempDir::new().expect("temp dir");
    let broken = CLEAN_LAW.replace("TOTAL GENERAL,,,,1500", "TOTAL GENERAL,,,,1400");
    let paths = [
        write_sheet(dir.path(), "ley_2024.csv", &broken),
        dir.path().join("absent.csv"),
    ];

    let outcomes = run(&paths);
    assert_eq!(exit_code_for(&outcomes), 2);
}

#[test]
fn semicolon_export_with_decimal_commas() {
    let dir = TempDir::new().expect("temp dir");
    let sheet = CLEAN_LAW
        .replace(',', ";")
        .replace(";1000", ";1.000,00")
        .replace(";1500", ";1.500,00");
    let path = write_sheet(dir.path(), "ley-2024.csv", &sheet);
    let mut options = options(true);
    options.worksheet = WorksheetOptions::default().with_delimiter(b';');

    let outcomes = process_files(&[path], &options, &LedgerConfig::default());
    assert_eq!(exit_code_for(&outcomes), 0);
    let parsed = outcomes[0].parsed().expect("parsed");
    assert_eq!(parsed.table.summary.line, 11);
}

#[test]
fn parse_only_runs_no_checks() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_sheet(dir.path(), "ley_2024.csv", CLEAN_LAW);

    let outcomes = process_files(&[path], &options(false), &LedgerConfig::default());
    let parsed = outcomes[0].parsed().expect("parsed");
    assert!(parsed.report.is_none());
    assert_eq!(parsed.table.records.len(), 5);
    assert_eq!(exit_code_for(&outcomes), 0);
}

#[test]
fn explicit_year_wins_over_file_name() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_sheet(dir.path(), "ley_2024.csv", CLEAN_LAW);
    let mut options = options(true);
    options.year = Some(2019);

    let outcomes = process_files(&[path], &options, &LedgerConfig::default());
    assert_eq!(outcomes[0].year, Some(2019));
    assert_eq!(
        outcomes[0].report().map(|report| report.metadata.year),
        Some(Some(2019))
    );
}

#[test]
fn output_files_are_written_per_worksheet() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("out");
    let sheet = CLEAN_LAW.replace("Ministerio de Salud,,,1000", "Ministerio de Salud,,,950");
    let paths = [
        write_sheet(dir.path(), "ley_2024.csv", &sheet),
        write_sheet(
            dir.path(),
            "ley_2023.csv",
            &CLEAN_LAW.replace("TOTAL GENERAL,,,,1500\n", ""),
        ),
    ];
    let outcomes = run(&paths);

    for outcome in &outcomes {
        write_records_json(&out, outcome).expect("records json");
        write_report_json(&out, outcome).expect("report json");
        write_markdown(&out, outcome).expect("markdown");
    }

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out.join("ley_2024.report.json")).expect("read report"),
    )
    .expect("report json");
    assert_eq!(report["metadata"]["dataset"], "ley_2024.csv");
    assert_eq!(report["metadata"]["record_count"], 5);

    let records: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out.join("ley_2024.records.json")).expect("read records"),
    )
    .expect("records json");
    assert_eq!(records["records"].as_array().map(Vec::len), Some(5));

    let markdown = fs::read_to_string(out.join("ley_2024.report.md")).expect("read markdown");
    assert!(markdown.starts_with("# Validation report: ley_2024.csv"));
    assert!(markdown.contains("## Findings"));
    assert!(markdown.contains("Ministerio de Salud"));

    assert!(out.join("ley_2023.diagnostics.json").exists());
    assert!(!out.join("ley_2023.report.json").exists());
    assert!(!out.join("ley_2023.report.md").exists());
}
