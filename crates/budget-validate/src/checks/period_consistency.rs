//! Period execution against the annual credit.
//!
//! Execution cannot outrun the credit it draws on. For a positive credit the
//! executed amount must not exceed it; for a negative credit (a reduction)
//! execution must not be positive and must not exceed the credit's
//! magnitude. Opposite signs are a violation on their own. Comparisons use
//! the absolute total tolerance.

use budget_model::{CheckId, Finding, PeriodPair, Severity, SourceType};

use super::{CheckContext, ValidationCheck, exceeds, value_sites};
use crate::ValidationInput;

pub struct PeriodConsistency;

/// Why a period/annual pair is inconsistent.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Violation {
    SignMismatch,
    Exceeds,
}

fn classify(period: f64, annual: f64, tolerance: f64) -> Option<Violation> {
    if period != 0.0 && annual != 0.0 && period.signum() != annual.signum() {
        return Some(Violation::SignMismatch);
    }
    if annual < 0.0 {
        let overshoot = period.abs() - annual.abs();
        return (overshoot > 0.0 && exceeds(overshoot, tolerance)).then_some(Violation::Exceeds);
    }
    let overshoot = period - annual;
    (overshoot > 0.0 && exceeds(overshoot, tolerance)).then_some(Violation::Exceeds)
}

impl ValidationCheck for PeriodConsistency {
    fn id(&self) -> CheckId {
        CheckId::PeriodConsistency
    }

    fn applies_to(&self, source: SourceType) -> bool {
        source.is_execution()
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let Some(PeriodPair { period, annual }) = ctx.schema.period_pair else {
            return Vec::new();
        };
        let tolerance = ctx.tolerances.total_absolute;
        let mut findings = Vec::new();
        for site in value_sites(input, &ctx.hierarchy) {
            let (Some(executed), Some(credit)) = (site.values.get(period), site.values.get(annual))
            else {
                continue;
            };
            let Some(violation) = classify(executed, credit, tolerance) else {
                continue;
            };
            let message = match violation {
                Violation::SignMismatch => format!(
                    "{period} {executed:.2} and {annual} {credit:.2} have opposite signs"
                ),
                Violation::Exceeds => format!(
                    "{period} {executed:.2} exceeds {annual} {credit:.2} by {:.2}",
                    executed.abs() - credit.abs()
                ),
            };
            findings.push(
                ctx.finding(self.id(), site.level, Severity::Error, site.entity, message)
                    .at_line(site.line)
                    .for_field(period)
                    .with_comparison(credit, executed),
            );
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_credit() {
        assert_eq!(classify(80.0, 100.0, 2.0), None);
        assert_eq!(classify(101.5, 100.0, 2.0), None);
        assert_eq!(classify(103.0, 100.0, 2.0), Some(Violation::Exceeds));
        assert_eq!(classify(-5.0, 100.0, 2.0), Some(Violation::SignMismatch));
    }

    #[test]
    fn negative_credit() {
        assert_eq!(classify(-50.0, -100.0, 2.0), None);
        assert_eq!(classify(-110.0, -100.0, 2.0), Some(Violation::Exceeds));
        assert_eq!(classify(10.0, -100.0, 2.0), Some(Violation::SignMismatch));
    }

    #[test]
    fn zero_values_never_mismatch_signs() {
        assert_eq!(classify(0.0, -100.0, 2.0), None);
        assert_eq!(classify(-3.0, 0.0, 2.0), None);
        assert_eq!(classify(3.0, 0.0, 2.0), Some(Violation::Exceeds));
    }
}
