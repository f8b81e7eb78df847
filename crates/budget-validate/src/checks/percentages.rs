//! Reported percentages against their operands.

use budget_model::{CheckId, FieldKind, Finding, Severity, SourceType};

use super::{CheckContext, ValidationCheck, exceeds, value_sites};
use crate::ValidationInput;

pub struct Percentages;

/// Smallest allowed deviation, in percentage points.
const MIN_POINTS: f64 = 0.01;

impl ValidationCheck for Percentages {
    fn id(&self) -> CheckId {
        CheckId::Percentages
    }

    fn applies_to(&self, source: SourceType) -> bool {
        source.is_execution()
    }

    fn run(&self, input: &ValidationInput<'_>, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let relative = ctx.tolerances.percentage_relative;
        let mut findings = Vec::new();
        for site in value_sites(input, &ctx.hierarchy) {
            for field in ctx.schema.percentage_fields() {
                let FieldKind::Percentage {
                    numerator,
                    denominator,
                } = field.kind
                else {
                    continue;
                };
                let Some(reported) = site.values.get(field.name) else {
                    continue;
                };
                let finding = |default: Severity, message: String| {
                    ctx.finding(self.id(), site.level, default, site.entity.clone(), message)
                        .at_line(site.line)
                        .for_field(field.name)
                };

                if reported < 0.0 {
                    findings.push(finding(
                        Severity::Error,
                        format!("{} is negative: {reported:.2}%", field.name),
                    ));
                }

                if let (Some(num), Some(den)) =
                    (site.values.get(numerator), site.values.get(denominator))
                    && den != 0.0
                {
                    let computed = num / den * 100.0;
                    let tolerance = (relative * computed.abs()).max(MIN_POINTS);
                    let difference = computed - reported;
                    if exceeds(difference, tolerance) {
                        let message = format!(
                            "{} reported {reported:.2}%, computed {computed:.2}% from \
                             {numerator}/{denominator}, difference {difference:.2} points",
                            field.name
                        );
                        findings.push(
                            finding(Severity::Error, message).with_comparison(computed, reported),
                        );
                    }
                }

                if reported > 100.0 + MIN_POINTS {
                    findings.push(finding(
                        Severity::Warning,
                        format!("{} above 100%: {reported:.2}%", field.name),
                    ));
                }
            }
        }
        findings
    }
}
