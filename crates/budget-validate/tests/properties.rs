// Property-based tests for the validation checks.
// CI: 64 cases (default). Soak: PROPTEST_CASES=5000 cargo test --release

mod common;

use std::collections::BTreeSet;

use budget_model::{
    CheckId, HierarchyLevel, LedgerConfig, SourceFamily, Tolerances, ValidationReport,
};
use common::{Sheet, validate_table};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(64),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

/// Org units of programs of (subprogram amounts, printed total drift in cents).
type Ledger = Vec<Vec<(Vec<u32>, i16)>>;

fn arb_ledger() -> impl Strategy<Value = Ledger> {
    let program = (prop::collection::vec(1u32..20_000, 1..4), -300i16..=300);
    let org = prop::collection::vec(program, 1..4);
    prop::collection::vec(org, 1..4)
}

fn law_sheet(ledger: &Ledger) -> Sheet {
    let mut sheet = Sheet::law();
    let mut grand = 0.0;
    for (org_index, org) in ledger.iter().enumerate() {
        let totals: Vec<f64> = org
            .iter()
            .map(|(subs, drift)| {
                subs.iter().map(|&v| f64::from(v)).sum::<f64>() + f64::from(*drift) / 100.0
            })
            .collect();
        let org_total: f64 = totals.iter().sum();
        grand += org_total;
        sheet = sheet.org(
            &(100 + org_index).to_string(),
            &format!("Ministerio {org_index}"),
            &[org_total],
        );
        for (program_index, ((subs, _), total)) in org.iter().zip(&totals).enumerate() {
            sheet = sheet.program(
                &(10 + program_index).to_string(),
                &format!("Linea {program_index}"),
                &[*total],
            );
            for (sub_index, amount) in subs.iter().enumerate() {
                sheet = sheet.sub(
                    &format!("{:02}", sub_index + 1),
                    &format!("Actividad {sub_index}"),
                    &[f64::from(*amount)],
                );
            }
        }
    }
    sheet.grand_total(&[grand])
}

fn with_total_tolerance(tolerance: f64) -> LedgerConfig {
    LedgerConfig::default().with_tolerances(
        SourceFamily::Law,
        Tolerances {
            total_absolute: tolerance,
            percentage_relative: 0.0025,
        },
    )
}

/// Failures keyed by check, entity and field.
fn failure_keys(report: &ValidationReport) -> BTreeSet<(String, String, Option<String>)> {
    report
        .findings()
        .map(|(check, finding)| {
            (
                check.to_string(),
                finding.entity.clone(),
                finding.field.clone(),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn lowering_tolerance_never_removes_failures(
        ledger in arb_ledger(),
        loose in 0.0f64..5.0,
        tighten in 0.0f64..=1.0,
    ) {
        let table = law_sheet(&ledger).parse();
        let strict = loose * tighten;
        let loose_report = validate_table(&table, &with_total_tolerance(loose));
        let strict_report = validate_table(&table, &with_total_tolerance(strict));

        let loose_keys = failure_keys(&loose_report);
        let strict_keys = failure_keys(&strict_report);
        prop_assert!(
            loose_keys.is_subset(&strict_keys),
            "tolerance {loose} -> {strict} dropped {:?}",
            loose_keys.difference(&strict_keys).collect::<Vec<_>>()
        );
        prop_assert!(strict_report.error_count() >= loose_report.error_count());
    }

    #[test]
    fn drift_within_tolerance_never_fails_program_sums(ledger in arb_ledger()) {
        let table = law_sheet(&ledger).parse();
        let report = validate_table(&table, &with_total_tolerance(3.0));
        let program_failures = report
            .findings()
            .filter(|(check, finding)| {
                *check == CheckId::HierarchicalTotals && finding.level == HierarchyLevel::Program
            })
            .count();
        prop_assert_eq!(program_failures, 0);
    }
}
