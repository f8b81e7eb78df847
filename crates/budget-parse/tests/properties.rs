// Property-based tests for hierarchy reconstruction.
// CI: 64 cases (default). Soak: PROPTEST_CASES=5000 cargo test --release

mod common;

use std::collections::BTreeMap;

use budget_model::{CellValue, LedgerConfig, RawRow, RecordLevel, SourceType, fields};
use budget_parse::{AnomalyKind, parse_rows};
use common::SheetBuilder;
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

/// Org units of programs of subprogram amounts, plus a rounding offset per
/// program header.
type Ledger = Vec<Vec<(Vec<u32>, i8)>>;

fn arb_ledger() -> impl Strategy<Value = Ledger> {
    let program = (prop::collection::vec(1u32..50_000, 1..5), -40i8..=40);
    let org = prop::collection::vec(program, 1..4);
    prop::collection::vec(org, 1..4)
}

/// Law worksheet whose printed program totals differ from the subprogram
/// sums by at most 0.40.
fn law_sheet(ledger: &Ledger) -> SheetBuilder {
    let mut sheet = SheetBuilder::law().text("Ley de Presupuesto");
    let mut grand = 0.0;
    for (org_index, org) in ledger.iter().enumerate() {
        let program_totals: Vec<f64> = org
            .iter()
            .map(|(subs, offset)| {
                subs.iter().map(|&v| f64::from(v)).sum::<f64>() + f64::from(*offset) / 100.0
            })
            .collect();
        let org_total: f64 = program_totals.iter().sum();
        grand += org_total;
        sheet = sheet.org(
            &(100 + org_index).to_string(),
            &format!("Ministerio {org_index}"),
            &[org_total],
        );
        for (program_index, ((subs, _), total)) in org.iter().zip(&program_totals).enumerate() {
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

proptest! {
    #![proptest_config(config())]

    #[test]
    fn parsing_is_idempotent(ledger in arb_ledger()) {
        let sheet = law_sheet(&ledger);
        let first = sheet.parse().expect("parse");
        let second = sheet.parse().expect("parse");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn program_sums_close_within_tolerance(ledger in arb_ledger()) {
        let table = law_sheet(&ledger).parse().expect("parse");
        let expected_records: usize = ledger
            .iter()
            .flat_map(|org| org.iter().map(|(subs, _)| subs.len()))
            .sum();
        prop_assert_eq!(table.records.len(), expected_records);

        let mut sums: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
        for record in &table.records {
            prop_assert_eq!(record.level, RecordLevel::Subprogram);
            let block = record.program_block.expect("program context");
            let printed = record
                .program_totals
                .get(fields::INITIAL_CREDIT)
                .expect("program total");
            let entry = sums.entry(block).or_insert((0.0, printed));
            entry.0 += record.values.get(fields::INITIAL_CREDIT).unwrap_or(0.0);
        }
        for (block, (sum, printed)) in sums {
            prop_assert!(
                (sum - printed).abs() <= 0.5,
                "program block {block}: sum {sum} vs printed {printed}"
            );
        }
    }

    #[test]
    fn stray_row_adds_one_anomaly(ledger in arb_ledger()) {
        let sheet = law_sheet(&ledger);
        let baseline = sheet.parse().expect("parse");

        let mut rows = vec![RawRow::new(
            0,
            vec![
                CellValue::from_text("Programa 99"),
                CellValue::from_text("Fondo especial"),
            ],
        )];
        rows.extend(sheet.build());
        let noisy = parse_rows(&rows, SourceType::AnnualLaw, None, &LedgerConfig::default())
            .expect("parse");

        prop_assert_eq!(noisy.records.len(), baseline.records.len());
        prop_assert_eq!(
            noisy.diagnostics.anomalies.len(),
            baseline.diagnostics.anomalies.len() + 1
        );
        prop_assert_eq!(
            noisy.diagnostics.anomaly_count(AnomalyKind::ProgramOutsideOrgUnit),
            1
        );
    }
}
