//! Consistency checks over reconstructed budget ledgers.
//!
//! The validator reads only the flat records and the grand total summary.
//! Checks run from a fixed registry, each producing findings whose severity
//! can be overridden per check and hierarchy level through the
//! [`LedgerConfig`].

pub mod checks;
pub mod hierarchy;

use budget_model::{
    FlatRecord, GrandTotalSummary, LedgerConfig, ReportMetadata, SourceType, ValidationReport,
};
use chrono::{DateTime, Utc};
use tracing::info;

pub use checks::{CheckContext, CheckRegistry, FieldPresence, ValidationCheck};
pub use hierarchy::{HierarchyView, OrgBlock, ProgramBlock};

/// What the checks look at.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    pub source_type: SourceType,
    pub year: Option<u16>,
    pub records: &'a [FlatRecord],
    pub summary: &'a GrandTotalSummary,
}

impl<'a> ValidationInput<'a> {
    pub fn new(
        source_type: SourceType,
        year: Option<u16>,
        records: &'a [FlatRecord],
        summary: &'a GrandTotalSummary,
    ) -> Self {
        Self {
            source_type,
            year,
            records,
            summary,
        }
    }
}

/// Run the standard checks and build the report.
///
/// `generated_at` is supplied by the caller so identical input always
/// yields an identical report.
pub fn validate(
    input: &ValidationInput<'_>,
    config: &LedgerConfig,
    dataset: &str,
    generated_at: DateTime<Utc>,
) -> ValidationReport {
    let results = CheckRegistry::standard().run(input, config);
    let report = ValidationReport::new(
        ReportMetadata {
            source_type: input.source_type,
            dataset: dataset.to_string(),
            year: input.year,
            generated_at,
            record_count: input.records.len(),
        },
        results,
    );
    info!(
        dataset,
        source = %input.source_type,
        checks = report.summary.total_checks,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );
    report
}
