//! Catalog field presence.
//!
//! A required field must hold a value somewhere in the record set and in
//! the grand total. A mapped column whose cells are all empty is as absent
//! as an unmapped one: either way the layout does not match the worksheet.

use budget_model::{CheckId, Finding, HierarchyLevel, Severity};

use super::{CheckContext, ValidationCheck};
use crate::ValidationInput;

pub struct RequiredFields;

impl ValidationCheck for RequiredFields {
    fn id(&self) -> CheckId {
        CheckId::RequiredFields
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for field in ctx.schema.required_fields() {
            if !ctx.presence.in_records(field.name) {
                let message = format!(
                    "required field {} ({}) has no value in any record",
                    field.name, field.label
                );
                findings.push(
                    ctx.finding(
                        self.id(),
                        HierarchyLevel::Overall,
                        Severity::Error,
                        "records",
                        message,
                    )
                    .for_field(field.name),
                );
            }
            if !ctx.presence.in_summary(field.name) {
                let message = format!(
                    "required field {} ({}) has no value in grand total",
                    field.name, field.label
                );
                findings.push(
                    ctx.finding(
                        self.id(),
                        HierarchyLevel::Overall,
                        Severity::Error,
                        "grand total",
                        message,
                    )
                    .at_line(Some(input.summary.line))
                    .for_field(field.name),
                );
            }
        }
        findings
    }
}
