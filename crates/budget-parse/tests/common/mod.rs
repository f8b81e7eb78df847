#![allow(dead_code)]

use budget_model::{
    CellValue, ColumnLayout, FieldColumns, HierarchyDepth, LedgerConfig, RawRow, SourceType,
    schema_for,
};
use budget_parse::{ParsedTable, Result, parse_rows};

/// Builds worksheets in the default column layout of a source type.
pub struct SheetBuilder {
    source: SourceType,
    layout: ColumnLayout,
    rows: Vec<RawRow>,
}

impl SheetBuilder {
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

    pub fn plan() -> Self {
        Self::new(SourceType::MediumTermPlan)
    }

    pub fn source(&self) -> SourceType {
        self.source
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

    fn field_columns(&self) -> Vec<FieldColumns> {
        schema_for(self.source)
            .fields
            .iter()
            .map(|field| {
                *self
                    .layout
                    .columns_for(field.name)
                    .expect("default layout covers catalog")
            })
            .collect()
    }

    fn push_row(mut self, code: &str, name: &str, placed: Vec<(usize, CellValue)>) -> Self {
        let mut cells = vec![CellValue::Empty; self.width()];
        cells[self.layout.code_column] = CellValue::from_text(code);
        cells[self.layout.name_column] = CellValue::from_text(name);
        for (column, value) in placed {
            cells[column] = value;
        }
        let line = self.rows.len() + 1;
        self.rows.push(RawRow::new(line, cells));
        self
    }

    fn place(
        &self,
        values: &[Option<f64>],
        pick: impl Fn(&FieldColumns) -> Option<usize>,
    ) -> Vec<(usize, CellValue)> {
        self.field_columns()
            .iter()
            .zip(values)
            .filter_map(|(columns, value)| {
                let column = pick(columns)?;
                Some((column, value.map_or(CellValue::Empty, CellValue::Number)))
            })
            .collect()
    }

    /// Free text in the code column (titles, headings).
    pub fn text(self, text: &str) -> Self {
        self.push_row(text, "", Vec::new())
    }

    pub fn raw(mut self, cells: &[&str]) -> Self {
        let line = self.rows.len() + 1;
        self.rows.push(RawRow::new(
            line,
            cells.iter().map(|cell| CellValue::from_text(cell)).collect(),
        ));
        self
    }

    pub fn org(self, code: &str, name: &str, totals: &[f64]) -> Self {
        let totals: Vec<Option<f64>> = totals.iter().copied().map(Some).collect();
        self.org_values(code, name, &totals)
    }

    pub fn org_values(self, code: &str, name: &str, totals: &[Option<f64>]) -> Self {
        let placed = self.place(totals, |columns| columns.org_unit);
        self.push_row(&format!("Entidad {code}"), name, placed)
    }

    pub fn program(self, code: &str, name: &str, totals: &[f64]) -> Self {
        let totals: Vec<Option<f64>> = totals.iter().copied().map(Some).collect();
        let two_level = self.source.depth() == HierarchyDepth::Two;
        let placed = self.place(&totals, |columns| {
            if two_level {
                columns.leaf
            } else {
                columns.program
            }
        });
        self.push_row(&format!("Programa {code}"), name, placed)
    }

    pub fn sub(self, code: &str, name: &str, values: &[f64]) -> Self {
        let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        self.sub_values(code, name, &values)
    }

    pub fn sub_values(self, code: &str, name: &str, values: &[Option<f64>]) -> Self {
        let placed = self.place(values, |columns| columns.leaf);
        self.push_row(code, name, placed)
    }

    pub fn grand_total(self, totals: &[f64]) -> Self {
        let totals: Vec<Option<f64>> = totals.iter().copied().map(Some).collect();
        let placed = self.place(&totals, |columns| columns.total_candidates().next());
        self.push_row("TOTAL GENERAL", "", placed)
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn build(self) -> Vec<RawRow> {
        self.rows
    }

    pub fn parse(&self) -> Result<ParsedTable> {
        parse_rows(&self.rows, self.source, None, &LedgerConfig::default())
    }
}

/// Three org units, one of them with two programs, matching totals.
pub fn clean_law_sheet() -> SheetBuilder {
    SheetBuilder::law()
        .text("Ley de Presupuesto 2024")
        .raw(&["Código", "Denominación", "Subprograma", "Programa", "Entidad"])
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
