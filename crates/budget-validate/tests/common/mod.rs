#![allow(dead_code)]

use budget_model::{
    CellValue, ColumnLayout, FieldColumns, HierarchyDepth, LedgerConfig, RawRow, ReportPeriod,
    SourceType, ValidationReport, schema_for,
};
use budget_parse::{ParsedTable, parse_rows};
use budget_validate::{ValidationInput, validate};
use chrono::{DateTime, TimeZone, Utc};

/// Worksheet rows in the built-in layout of a source type.
pub struct Sheet {
    source: SourceType,
    layout: ColumnLayout,
    rows: Vec<RawRow>,
}

impl Sheet {
    pub fn new(source: SourceType) -> Self {
        Self {
            source,
            layout: ColumnLayout::default_for(source),
            rows: Vec::new(),
        }
    }

    pub fn law() -> Self {
        Self::new(SourceType::AnnualLaw)
    }

    pub fn execution() -> Self {
        Self::new(SourceType::ExecutionReport(ReportPeriod::H1))
    }

    pub fn plan() -> Self {
        Self::new(SourceType::MediumTermPlan)
    }

    fn width(&self) -> usize {
        self.layout
            .fields
            .values()
            .flat_map(|columns| [columns.leaf, columns.program, columns.org_unit])
            .flatten()
            .max()
            .unwrap_or(1)
            + 1
    }

    fn row(
        mut self,
        code: &str,
        name: &str,
        values: &[Option<f64>],
        pick: fn(&FieldColumns) -> Option<usize>,
    ) -> Self {
        let mut cells = vec![CellValue::Empty; self.width()];
        cells[self.layout.code_column] = CellValue::from_text(code);
        cells[self.layout.name_column] = CellValue::from_text(name);
        for (field, value) in schema_for(self.source).fields.iter().zip(values) {
            let column = self.layout.columns_for(field.name).and_then(pick);
            if let (Some(column), Some(value)) = (column, value) {
                cells[column] = CellValue::Number(*value);
            }
        }
        let line = self.rows.len() + 1;
        self.rows.push(RawRow::new(line, cells));
        self
    }

    pub fn title(mut self, text: &str) -> Self {
        let line = self.rows.len() + 1;
        self.rows.push(RawRow::new(line, vec![CellValue::from_text(text)]));
        self
    }

    pub fn org(self, code: &str, name: &str, totals: &[f64]) -> Self {
        let totals = some(totals);
        self.row(&format!("Entidad {code}"), name, &totals, |c| c.org_unit)
    }

    pub fn program(self, code: &str, name: &str, totals: &[f64]) -> Self {
        let totals = some(totals);
        let label = format!("Programa {code}");
        if self.source.depth() == HierarchyDepth::Two {
            self.row(&label, name, &totals, |c| c.leaf)
        } else {
            self.row(&label, name, &totals, |c| c.program)
        }
    }

    pub fn sub(self, code: &str, name: &str, values: &[f64]) -> Self {
        self.sub_values(code, name, &some(values))
    }

    pub fn sub_values(self, code: &str, name: &str, values: &[Option<f64>]) -> Self {
        self.row(code, name, values, |c| c.leaf)
    }

    pub fn grand_total(self, totals: &[f64]) -> Self {
        let totals = some(totals);
        self.row("TOTAL GENERAL", "", &totals, |c| c.total_candidates().next())
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    pub fn parse(&self) -> ParsedTable {
        self.parse_with(&LedgerConfig::default())
    }

    pub fn parse_with(&self, config: &LedgerConfig) -> ParsedTable {
        parse_rows(&self.rows, self.source, Some(2024), config).expect("sheet parses")
    }

    pub fn validate(&self) -> ValidationReport {
        self.validate_with(&LedgerConfig::default())
    }

    pub fn validate_with(&self, config: &LedgerConfig) -> ValidationReport {
        let table = self.parse_with(config);
        validate_table(&table, config)
    }
}

fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

pub fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn validate_table(table: &ParsedTable, config: &LedgerConfig) -> ValidationReport {
    let input = ValidationInput::new(table.source_type, table.year, &table.records, &table.summary);
    validate(&input, config, "test.csv", generated_at())
}

/// Two org units, three programs, totals that close exactly.
pub fn clean_law() -> Sheet {
    Sheet::law()
        .title("Ley de Presupuesto 2024")
        .org("101", "Ministerio de Salud", &[1000.0])
        .program("16", "Atención primaria", &[600.0])
        .sub("01", "Vacunación", &[400.0])
        .sub("02", "Control prenatal", &[200.0])
        .program("17", "Hospitales", &[400.0])
        .sub("01", "Equipamiento", &[400.0])
        .org("102", "Ministerio de Educación", &[500.0])
        .program("20", "Educación básica", &[500.0])
        .sub("01", "Escuelas rurales", &[300.0])
        .sub("02", "Comedores escolares", &[200.0])
        .grand_total(&[1500.0])
}

/// Execution report with annual credit, executed amount and percentage.
pub fn clean_execution() -> Sheet {
    Sheet::execution()
        .title("Ejecución presupuestaria, primer semestre")
        .org("101", "Ministerio de Salud", &[1000.0, 450.0, 45.0])
        .program("16", "Atención primaria", &[600.0, 300.0, 50.0])
        .sub("01", "Vacunación", &[400.0, 200.0, 50.0])
        .sub("02", "Control prenatal", &[200.0, 100.0, 50.0])
        .program("17", "Hospitales", &[400.0, 150.0, 37.5])
        .sub("01", "Equipamiento", &[400.0, 150.0, 37.5])
        .grand_total(&[1000.0, 450.0, 45.0])
}
