//! Degenerate law hierarchies.
//!
//! A law worksheet read with the wrong layout or labels often still yields
//! records, but flattened: every org unit ends up with a single program, or
//! no row is ever recognized as a subprogram.

use budget_model::{CheckId, Finding, HierarchyLevel, RecordLevel, Severity, SourceType};

use super::{CheckContext, ValidationCheck};
use crate::ValidationInput;

pub struct StructuralSanity;

impl ValidationCheck for StructuralSanity {
    fn id(&self) -> CheckId {
        CheckId::StructuralSanity
    }

    fn applies_to(&self, source: SourceType) -> bool {
        source == SourceType::AnnualLaw
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        let org_units = &ctx.hierarchy.org_units;

        if let [first, rest @ ..] = org_units.as_slice()
            && !rest.is_empty()
        {
            let programs = first.programs.len();
            if programs <= 1 && rest.iter().all(|org| org.programs.len() == programs) {
                findings.push(ctx.finding(
                    self.id(),
                    HierarchyLevel::Overall,
                    Severity::Error,
                    "hierarchy",
                    format!(
                        "all {} org unit blocks have exactly {programs} program(s)",
                        org_units.len()
                    ),
                ));
            }
        }

        let has_subprograms = input
            .records
            .iter()
            .any(|record| record.level == RecordLevel::Subprogram);
        if !has_subprograms {
            findings.push(ctx.finding(
                self.id(),
                HierarchyLevel::Overall,
                Severity::Error,
                "hierarchy",
                format!("none of the {} records is a subprogram", input.records.len()),
            ));
        }
        findings
    }
}
