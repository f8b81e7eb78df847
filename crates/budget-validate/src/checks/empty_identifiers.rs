//! Blank names at each hierarchy level.

use budget_model::{CheckId, Finding, FlatRecord, HierarchyLevel, Severity};

use super::{CheckContext, ValidationCheck};
use crate::ValidationInput;

pub struct EmptyIdentifiers;

impl EmptyIdentifiers {
    fn subprogram(&self, ctx: &CheckContext<'_>, record: &FlatRecord) -> Option<Finding> {
        let blank = record
            .subprogram_name
            .as_deref()
            .is_none_or(|name| name.trim().is_empty());
        blank.then(|| {
            ctx.finding(
                self.id(),
                HierarchyLevel::Subprogram,
                Severity::Warning,
                record.entity_path(),
                "subprogram has no name",
            )
            .at_line(Some(record.line))
        })
    }
}

impl ValidationCheck for EmptyIdentifiers {
    fn id(&self) -> CheckId {
        CheckId::EmptyIdentifiers
    }

    fn run(&self, _input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for org in &ctx.hierarchy.org_units {
            if org.name.trim().is_empty() {
                findings.push(
                    ctx.finding(
                        self.id(),
                        HierarchyLevel::OrgUnit,
                        Severity::Error,
                        org.label(),
                        format!("org unit block {} has no name", org.block + 1),
                    )
                    .at_line(Some(org.line)),
                );
            }
            findings.extend(org.orphans.iter().filter_map(|r| self.subprogram(ctx, r)));
            for program in &org.programs {
                if program.name.trim().is_empty() {
                    findings.push(
                        ctx.finding(
                            self.id(),
                            HierarchyLevel::Program,
                            Severity::Error,
                            org.program_path(program),
                            format!("program block {} has no name", program.block + 1),
                        )
                        .at_line(program.line),
                    );
                }
                findings.extend(
                    program
                        .subprograms
                        .iter()
                        .filter_map(|r| self.subprogram(ctx, r)),
                );
            }
        }
        findings
    }
}
