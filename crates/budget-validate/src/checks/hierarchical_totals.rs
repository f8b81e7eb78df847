//! Printed totals against the sum of their children.
//!
//! Three comparisons per amount field:
//! - the grand total against the org unit block totals
//! - each org unit block total against its program totals (plus leaves
//!   read before any program)
//! - each program total against its subprograms, when it has any
//!
//! A comparison is skipped when the printed total or any child value is
//! missing; those gaps are reported by `missing_financial_data`.

use budget_model::{CheckId, FieldValues, Finding, HierarchyLevel, Severity};

use super::{CheckContext, ValidationCheck};
use crate::ValidationInput;

pub struct HierarchicalTotals;

/// One printed total and the values that should add up to it.
struct Comparison<'a> {
    level: HierarchyLevel,
    entity: String,
    line: Option<usize>,
    total: &'a FieldValues,
    parts: Vec<&'a FieldValues>,
    /// What the parts are, for messages.
    parts_label: &'static str,
}

impl HierarchicalTotals {
    fn compare(&self, ctx: &CheckContext<'_>, cmp: &Comparison<'_>, findings: &mut Vec<Finding>) {
        if cmp.parts.is_empty() {
            return;
        }
        for field in ctx.schema.amount_fields() {
            let Some(expected) = cmp.total.get(field.name) else {
                continue;
            };
            let Some(actual) = sum(&cmp.parts, field.name) else {
                continue;
            };
            let difference = expected - actual;
            if !ctx.exceeds_total_tolerance(difference) {
                continue;
            }
            let message = format!(
                "{}: printed total {expected:.2}, sum of {} {actual:.2}, difference {difference:.2} \
                 (tolerance {:.2})",
                field.name, cmp.parts_label, ctx.tolerances.total_absolute
            );
            findings.push(
                ctx.finding(self.id(), cmp.level, Severity::Error, cmp.entity.clone(), message)
                    .at_line(cmp.line)
                    .for_field(field.name)
                    .with_comparison(expected, actual),
            );
        }
    }
}

/// Sum of one field over all parts; `None` if any part lacks a value.
fn sum(parts: &[&FieldValues], field: &str) -> Option<f64> {
    parts.iter().map(|values| values.get(field)).sum()
}

impl ValidationCheck for HierarchicalTotals {
    fn id(&self) -> CheckId {
        CheckId::HierarchicalTotals
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        let hierarchy = &ctx.hierarchy;

        self.compare(
            ctx,
            &Comparison {
                level: HierarchyLevel::Overall,
                entity: "grand total".to_string(),
                line: Some(input.summary.line),
                total: &input.summary.values,
                parts: hierarchy.org_units.iter().map(|org| org.totals).collect(),
                parts_label: "org units",
            },
            &mut findings,
        );

        for org in &hierarchy.org_units {
            self.compare(
                ctx,
                &Comparison {
                    level: HierarchyLevel::OrgUnit,
                    entity: org.label(),
                    line: Some(org.line),
                    total: org.totals,
                    parts: org.child_totals().collect(),
                    parts_label: "programs",
                },
                &mut findings,
            );
            for program in &org.programs {
                self.compare(
                    ctx,
                    &Comparison {
                        level: HierarchyLevel::Program,
                        entity: org.program_path(program),
                        line: program.line,
                        total: program.totals,
                        parts: program.subprograms.iter().map(|r| &r.values).collect(),
                        parts_label: "subprograms",
                    },
                    &mut findings,
                );
            }
        }
        findings
    }
}
