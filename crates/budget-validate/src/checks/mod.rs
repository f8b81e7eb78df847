//! Validation check modules.
//!
//! Each module implements one [`ValidationCheck`]. The registry runs them in
//! a fixed order and never stops early: a failing check does not hide the
//! findings of the ones after it.

mod empty_identifiers;
mod hierarchical_totals;
mod missing_financial_data;
mod negative_totals;
mod percentages;
mod period_consistency;
mod required_fields;
mod structural_sanity;

use std::collections::BTreeSet;

use budget_model::{
    CheckId, CheckResult, FieldValues, Finding, FlatRecord, HierarchyLevel, LedgerConfig,
    Severity, SourceSchema, SourceType, Tolerances, schema_for,
};
use tracing::debug;

use crate::ValidationInput;
use crate::hierarchy::HierarchyView;

pub use empty_identifiers::EmptyIdentifiers;
pub use hierarchical_totals::HierarchicalTotals;
pub use missing_financial_data::MissingFinancialData;
pub use negative_totals::NegativeTotals;
pub use percentages::Percentages;
pub use period_consistency::PeriodConsistency;
pub use required_fields::RequiredFields;
pub use structural_sanity::StructuralSanity;

/// A consistency check over one reconstructed dataset.
pub trait ValidationCheck: Send + Sync {
    fn id(&self) -> CheckId;

    /// Severity of the check's primary failure before overrides.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self, source: SourceType) -> bool {
        let _ = source;
        true
    }

    /// Findings in record-set order.
    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding>;
}

/// Shared, read-only state handed to every check.
#[derive(Debug)]
pub struct CheckContext<'a> {
    pub config: &'a LedgerConfig,
    pub schema: &'static SourceSchema,
    pub tolerances: Tolerances,
    pub hierarchy: HierarchyView<'a>,
    pub presence: FieldPresence<'a>,
}

impl<'a> CheckContext<'a> {
    pub fn new(input: &ValidationInput<'a>, config: &'a LedgerConfig) -> Self {
        Self {
            config,
            schema: schema_for(input.source_type),
            tolerances: config.tolerances_for(input.source_type),
            hierarchy: HierarchyView::build(input.records),
            presence: FieldPresence::build(input),
        }
    }

    /// Finding with its severity resolved through the configured overrides.
    pub fn finding(
        &self,
        check: CheckId,
        level: HierarchyLevel,
        default: Severity,
        entity: impl Into<String>,
        message: impl Into<String>,
    ) -> Finding {
        let severity = self.config.severity_for(check, level, default);
        Finding::new(severity, level, entity, message)
    }

    /// Whether `|difference|` is beyond the absolute total tolerance.
    pub fn exceeds_total_tolerance(&self, difference: f64) -> bool {
        exceeds(difference, self.tolerances.total_absolute)
    }
}

/// Fields holding at least one value.
///
/// A mapped column whose cells are all empty counts as absent. Records
/// include the parent totals they carry; the grand total is tracked apart.
#[derive(Debug, Clone, Default)]
pub struct FieldPresence<'a> {
    records: BTreeSet<&'a str>,
    summary: BTreeSet<&'a str>,
}

impl<'a> FieldPresence<'a> {
    pub fn build(input: &ValidationInput<'a>) -> Self {
        let records = input
            .records
            .iter()
            .flat_map(|record| {
                valued_fields(&record.values)
                    .chain(valued_fields(&record.org_unit_totals))
                    .chain(valued_fields(&record.program_totals))
            })
            .collect();
        Self {
            records,
            summary: valued_fields(&input.summary.values).collect(),
        }
    }

    pub fn in_records(&self, field: &str) -> bool {
        self.records.contains(field)
    }

    pub fn in_summary(&self, field: &str) -> bool {
        self.summary.contains(field)
    }

    /// Presence in the scope a value site belongs to.
    pub(crate) fn at_site(&self, site: &ValueSite<'_>, field: &str) -> bool {
        match site.level {
            HierarchyLevel::Overall => self.in_summary(field),
            _ => self.in_records(field),
        }
    }
}

fn valued_fields(values: &FieldValues) -> impl Iterator<Item = &str> {
    values
        .iter()
        .filter_map(|(name, value)| value.map(|_| name))
}

/// A set of values printed for one entity.
#[derive(Debug, Clone)]
pub(crate) struct ValueSite<'a> {
    pub level: HierarchyLevel,
    pub entity: String,
    pub line: Option<usize>,
    pub values: &'a FieldValues,
}

/// Every printed value set exactly once: the grand total, then each org
/// unit block followed by its leaves and programs in encounter order.
pub(crate) fn value_sites<'a>(
    input: &ValidationInput<'a>,
    hierarchy: &HierarchyView<'a>,
) -> Vec<ValueSite<'a>> {
    let mut sites = vec![ValueSite {
        level: HierarchyLevel::Overall,
        entity: "grand total".to_string(),
        line: Some(input.summary.line),
        values: &input.summary.values,
    }];
    for org in &hierarchy.org_units {
        sites.push(ValueSite {
            level: HierarchyLevel::OrgUnit,
            entity: org.label(),
            line: Some(org.line),
            values: org.totals,
        });
        sites.extend(org.orphans.iter().map(|&record| leaf_site(record)));
        for program in &org.programs {
            sites.push(ValueSite {
                level: HierarchyLevel::Program,
                entity: org.program_path(program),
                line: program.line,
                values: program.totals,
            });
            sites.extend(program.subprograms.iter().map(|&record| leaf_site(record)));
        }
    }
    sites
}

fn leaf_site(record: &FlatRecord) -> ValueSite<'_> {
    ValueSite {
        level: HierarchyLevel::Subprogram,
        entity: record.entity_path(),
        line: Some(record.line),
        values: &record.values,
    }
}

/// Absolute comparison with a small allowance for float summation noise.
pub(crate) fn exceeds(difference: f64, tolerance: f64) -> bool {
    difference.abs() - tolerance > 1e-9
}

/// Ordered collection of checks.
pub struct CheckRegistry {
    checks: Vec<Box<dyn ValidationCheck>>,
}

impl CheckRegistry {
    /// The built-in checks in their reporting order.
    pub fn standard() -> Self {
        Self {
            checks: vec![
                // 1. Catalog fields present in records and grand total
                Box::new(RequiredFields),
                // 2. Org unit, program and subprogram names
                Box::new(EmptyIdentifiers),
                // 3. Null cells in extracted fields
                Box::new(MissingFinancialData),
                // 4. Printed totals against the sum of their children
                Box::new(HierarchicalTotals),
                // 5. Negative amounts (warnings)
                Box::new(NegativeTotals),
                // 6. Period execution against annual credit
                Box::new(PeriodConsistency),
                // 7. Reported percentages against their operands
                Box::new(Percentages),
                // 8. Degenerate law hierarchies
                Box::new(StructuralSanity),
            ],
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = CheckId> {
        self.checks.iter().map(|check| check.id())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check that applies to the input's source type.
    pub fn run(&self, input: &ValidationInput<'_>, config: &LedgerConfig) -> Vec<CheckResult> {
        let ctx = CheckContext::new(input, config);
        let mut results = Vec::new();
        for check in &self.checks {
            if !check.applies_to(input.source_type) {
                continue;
            }
            let id = check.id();
            let findings = check.run(input, &ctx);
            debug!(check = %id, findings = findings.len(), "check finished");
            let default =
                config.severity_for(id, HierarchyLevel::Overall, check.default_severity());
            results.push(CheckResult::from_findings(id, default, findings));
        }
        results
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
