//! Negative amounts.
//!
//! Negative figures are legal (reductions, reimbursements) but unusual
//! enough to review, so they are warnings at every level.

use budget_model::{CheckId, Finding, Severity};

use super::{CheckContext, ValidationCheck, value_sites};
use crate::ValidationInput;

pub struct NegativeTotals;

impl ValidationCheck for NegativeTotals {
    fn id(&self) -> CheckId {
        CheckId::NegativeTotals
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for site in value_sites(input, &ctx.hierarchy) {
            for field in ctx.schema.amount_fields() {
                let Some(value) = site.values.get(field.name) else {
                    continue;
                };
                if value >= 0.0 {
                    continue;
                }
                findings.push(
                    ctx.finding(
                        self.id(),
                        site.level,
                        Severity::Warning,
                        site.entity.clone(),
                        format!("{} is negative: {value:.2}", field.name),
                    )
                    .at_line(site.line)
                    .for_field(field.name),
                );
            }
        }
        findings
    }
}
