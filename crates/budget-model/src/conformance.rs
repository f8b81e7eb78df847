//! Validation results and the aggregated report.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceType;

/// Failure severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed; drives a non-zero exit code.
    Error,
    /// Should be reviewed.
    Warning,
}

impl Severity {
    /// Parse severity from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// Level of the hierarchy a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    /// The dataset or grand total as a whole.
    Overall,
    OrgUnit,
    Program,
    Subprogram,
}

impl HierarchyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::OrgUnit => "org_unit",
            Self::Program => "program",
            Self::Subprogram => "subprogram",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a registered validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    RequiredFields,
    EmptyIdentifiers,
    MissingFinancialData,
    HierarchicalTotals,
    NegativeTotals,
    PeriodConsistency,
    Percentages,
    StructuralSanity,
}

impl CheckId {
    pub const ALL: [CheckId; 8] = [
        Self::RequiredFields,
        Self::EmptyIdentifiers,
        Self::MissingFinancialData,
        Self::HierarchicalTotals,
        Self::NegativeTotals,
        Self::PeriodConsistency,
        Self::Percentages,
        Self::StructuralSanity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequiredFields => "required_fields",
            Self::EmptyIdentifiers => "empty_identifiers",
            Self::MissingFinancialData => "missing_financial_data",
            Self::HierarchicalTotals => "hierarchical_totals",
            Self::NegativeTotals => "negative_totals",
            Self::PeriodConsistency => "period_consistency",
            Self::Percentages => "percentages",
            Self::StructuralSanity => "structural_sanity",
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        CheckId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| format!("Unknown check: {s}"))
    }
}

/// One failed expectation with its entity context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub level: HierarchyLevel,
    /// Entity path, e.g. `101 Ministerio de Salud / 16 Atención primaria`.
    pub entity: String,
    /// Source line, when the finding is about a single row.
    pub line: Option<usize>,
    pub field: Option<String>,
    pub expected: Option<f64>,
    pub actual: Option<f64>,
    pub difference: Option<f64>,
    pub message: String,
}

impl Finding {
    pub fn new(
        severity: Severity,
        level: HierarchyLevel,
        entity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            level,
            entity: entity.into(),
            line: None,
            field: None,
            expected: None,
            actual: None,
            difference: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn for_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    /// Attach an expected/actual pair; the difference is `expected - actual`.
    pub fn with_comparison(mut self, expected: f64, actual: f64) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self.difference = Some(expected - actual);
        self
    }
}

/// Outcome of one check.
///
/// `severity` is the most severe finding's severity, or the check's default
/// when it passed. Each finding keeps its own severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: CheckId,
    pub severity: Severity,
    pub passed: bool,
    /// Findings in record-set order.
    pub failures: Vec<Finding>,
}

impl CheckResult {
    pub fn pass(check: CheckId, severity: Severity) -> Self {
        Self {
            check,
            severity,
            passed: true,
            failures: Vec::new(),
        }
    }

    /// Result for the findings of one run, in the order they were produced.
    pub fn from_findings(check: CheckId, default: Severity, findings: Vec<Finding>) -> Self {
        match findings.iter().map(|finding| finding.severity).min() {
            None => Self::pass(check, default),
            Some(severity) => Self {
                check,
                severity,
                passed: false,
                failures: findings,
            },
        }
    }

    pub fn has_severity(&self, severity: Severity) -> bool {
        self.failures
            .iter()
            .any(|finding| finding.severity == severity)
    }
}

/// Counts over the checks that ran.
///
/// A check with both error and warning findings counts in both columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub with_warnings: usize,
    pub with_errors: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let with = |severity: Severity| {
            results
                .iter()
                .filter(|result| result.has_severity(severity))
                .count()
        };
        Self {
            total_checks: results.len(),
            passed: results.iter().filter(|result| result.passed).count(),
            with_warnings: with(Severity::Warning),
            with_errors: with(Severity::Error),
        }
    }
}

/// Dataset identity and generation details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub source_type: SourceType,
    /// Dataset identity, typically the worksheet file name.
    pub dataset: String,
    pub year: Option<u16>,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
}

/// Validation outcome for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub results: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn new(metadata: ReportMetadata, results: Vec<CheckResult>) -> Self {
        Self {
            summary: ReportSummary::from_results(&results),
            metadata,
            results,
        }
    }

    /// All findings in report order.
    pub fn findings(&self) -> impl Iterator<Item = (CheckId, &Finding)> {
        self.results
            .iter()
            .flat_map(|result| result.failures.iter().map(move |f| (result.check, f)))
    }

    pub fn error_count(&self) -> usize {
        self.findings()
            .filter(|(_, finding)| finding.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings()
            .filter(|(_, finding)| finding.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// The result of one check, if it ran.
    pub fn result_for(&self, check: CheckId) -> Option<&CheckResult> {
        self.results.iter().find(|result| result.check == check)
    }

    /// Whether a check ran and produced no failures.
    pub fn check_passed(&self, check: CheckId) -> bool {
        self.result_for(check).is_some_and(|result| result.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding::new(severity, HierarchyLevel::Program, "101 / 16", "example").at_line(Some(4))
    }

    #[test]
    fn findings_keep_production_order() {
        let result = CheckResult::from_findings(
            CheckId::MissingFinancialData,
            Severity::Error,
            vec![finding(Severity::Warning), finding(Severity::Error)],
        );
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::Error);
        let order: Vec<Severity> = result.failures.iter().map(|f| f.severity).collect();
        assert_eq!(order, vec![Severity::Warning, Severity::Error]);
    }

    #[test]
    fn warning_only_result_is_a_warning() {
        let result = CheckResult::from_findings(
            CheckId::NegativeTotals,
            Severity::Warning,
            vec![finding(Severity::Warning)],
        );
        assert_eq!(result.severity, Severity::Warning);
        assert!(!result.has_severity(Severity::Error));
    }

    #[test]
    fn summary_counts_checks_not_findings() {
        let results = vec![
            CheckResult::from_findings(
                CheckId::HierarchicalTotals,
                Severity::Error,
                vec![finding(Severity::Error), finding(Severity::Error)],
            ),
            CheckResult::pass(CheckId::RequiredFields, Severity::Error),
            CheckResult::from_findings(
                CheckId::EmptyIdentifiers,
                Severity::Error,
                vec![finding(Severity::Warning), finding(Severity::Error)],
            ),
        ];
        let summary = ReportSummary::from_results(&results);
        assert_eq!(
            summary,
            ReportSummary {
                total_checks: 3,
                passed: 1,
                with_warnings: 1,
                with_errors: 2,
            }
        );
    }

    #[test]
    fn comparison_difference_is_expected_minus_actual() {
        let finding = finding(Severity::Error).with_comparison(1000.0, 950.0);
        assert_eq!(finding.difference, Some(50.0));
    }

    #[test]
    fn check_ids_parse_from_kebab_case() {
        assert_eq!(
            "hierarchical-totals".parse::<CheckId>(),
            Ok(CheckId::HierarchicalTotals)
        );
    }
}
