//! Null cells in extracted fields.
//!
//! A field that was extracted but holds no value is a gap in the published
//! figures. Gaps in printed totals are errors; gaps on individual
//! subprograms are warnings. Each printed value set is checked once, so an
//! empty org unit total is reported once, not once per record below it.
//! A field with no value anywhere in its scope is left to the required
//! fields check.

use budget_model::{CheckId, Finding, HierarchyLevel, Severity};

use super::{CheckContext, ValidationCheck, value_sites};
use crate::ValidationInput;

pub struct MissingFinancialData;

impl ValidationCheck for MissingFinancialData {
    fn id(&self) -> CheckId {
        CheckId::MissingFinancialData
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for site in value_sites(input, &ctx.hierarchy) {
            let default = match site.level {
                HierarchyLevel::Subprogram => Severity::Warning,
                _ => Severity::Error,
            };
            for field in ctx.schema.fields {
                if site.values.entry(field.name) != Some(None)
                    || !ctx.presence.at_site(&site, field.name)
                {
                    continue;
                }
                findings.push(
                    ctx.finding(
                        self.id(),
                        site.level,
                        default,
                        site.entity.clone(),
                        format!("{} has no value", field.name),
                    )
                    .at_line(site.line)
                    .for_field(field.name),
                );
            }
        }
        findings
    }
}
