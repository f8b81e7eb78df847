//! Hierarchy reconstruction from a classified row stream.
//!
//! The reconstructor is a state machine over [`ParserState`]. Org unit and
//! program headers open blocks, data rows become [`FlatRecord`]s carrying
//! their parents' identifiers and printed totals, and the grand total row
//! is kept apart as a [`GrandTotalSummary`]. Unexpected rows never abort:
//! they are recorded as anomalies and reading continues.

use budget_model::{
    FieldColumns, FieldValues, FlatRecord, GrandTotalSummary, HierarchyDepth, ParserState,
    RawRow, RecordLevel, RowType, SourceType, schema_for,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{Classification, RowClassifier};
use crate::diagnostics::{Anomaly, AnomalyKind, ParseDiagnostics};
use crate::error::{ParseError, Result, StructuralFailure};
use crate::matcher::normalize_label;
use crate::numeric::{Amount, cell_amount};

/// Reconstructed worksheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTable {
    pub source_type: SourceType,
    pub year: Option<u16>,
    pub records: Vec<FlatRecord>,
    pub summary: GrandTotalSummary,
    pub diagnostics: ParseDiagnostics,
}

#[derive(Debug, Clone)]
struct OrgContext {
    block: usize,
    line: usize,
    code: Option<String>,
    name: String,
    totals: FieldValues,
    programs: usize,
}

#[derive(Debug, Clone)]
struct ProgramContext {
    block: usize,
    line: usize,
    code: Option<String>,
    name: String,
    totals: FieldValues,
    subprograms: usize,
}

/// Which column of a field a row type carries its value in.
#[derive(Debug, Clone, Copy)]
enum ValueLevel {
    Leaf,
    Program,
    OrgUnit,
}

impl ValueLevel {
    fn column(self, columns: &FieldColumns) -> Option<usize> {
        match self {
            Self::Leaf => columns.leaf,
            Self::Program => columns.program,
            Self::OrgUnit => columns.org_unit,
        }
    }
}

/// Streaming reconstructor for one worksheet.
#[derive(Debug)]
pub struct HierarchyReconstructor<'a> {
    classifier: &'a RowClassifier,
    source: SourceType,
    year: Option<u16>,
    depth: HierarchyDepth,
    fields: Vec<(&'static str, FieldColumns)>,
    state: ParserState,
    org: Option<OrgContext>,
    program: Option<ProgramContext>,
    records: Vec<FlatRecord>,
    summary: Option<GrandTotalSummary>,
    diagnostics: ParseDiagnostics,
}

impl<'a> HierarchyReconstructor<'a> {
    pub fn new(classifier: &'a RowClassifier, source: SourceType, year: Option<u16>) -> Self {
        let layout = classifier.layout();
        let fields = schema_for(source)
            .fields
            .iter()
            .filter_map(|field| {
                layout
                    .columns_for(field.name)
                    .map(|columns| (field.name, *columns))
            })
            .collect();
        Self {
            classifier,
            source,
            year,
            depth: source.depth(),
            fields,
            state: ParserState::Init,
            org: None,
            program: None,
            records: Vec::new(),
            summary: None,
            diagnostics: ParseDiagnostics::default(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Feed the next row.
    pub fn push(&mut self, row: &RawRow) {
        let from = self.state;
        let classification = self.classifier.inspect(row, from);
        self.diagnostics.count_row(classification.row_type);
        match classification.row_type {
            RowType::GrandTotal => self.on_grand_total(row),
            RowType::OrgUnitHeader => self.on_org_unit(row, classification),
            RowType::ProgramHeader => self.on_program(row, classification),
            RowType::SubprogramRow => self.on_data_row(row),
            RowType::Noise => {}
        }
        self.diagnostics.count_transition(from, self.state);
    }

    /// Close open blocks and check the worksheet structure.
    pub fn finish(mut self) -> Result<ParsedTable> {
        self.close_org();
        self.diagnostics.records = self.records.len();

        let failure = match (&self.summary, self.records.is_empty()) {
            (None, _) => Some(StructuralFailure::MissingGrandTotal),
            (Some(_), true) => Some(StructuralFailure::NoRecords),
            (Some(_), false) => None,
        };
        if let Some(reason) = failure {
            warn!(
                source_type = %self.source,
                rows = self.diagnostics.rows_seen,
                reason = %reason,
                "structural failure"
            );
            return Err(ParseError::Structural {
                reason,
                diagnostics: Box::new(self.diagnostics),
            });
        }

        info!(
            source_type = %self.source,
            rows = self.diagnostics.rows_seen,
            records = self.records.len(),
            org_unit_blocks = self.diagnostics.org_unit_blocks,
            program_blocks = self.diagnostics.program_blocks,
            anomalies = self.diagnostics.anomalies.len(),
            "worksheet reconstructed"
        );
        Ok(ParsedTable {
            source_type: self.source,
            year: self.year,
            records: self.records,
            summary: self.summary.unwrap_or_default(),
            diagnostics: self.diagnostics,
        })
    }

    fn on_grand_total(&mut self, row: &RawRow) {
        if let Some(first) = &self.summary {
            let message = format!(
                "grand total repeated; keeping the one on line {}",
                first.line
            );
            self.anomaly(row, RowType::GrandTotal, AnomalyKind::SecondSummary, message);
        } else {
            let values = self.read_grand_total(row);
            self.summary = Some(GrandTotalSummary {
                line: row.line,
                values,
            });
            self.diagnostics.grand_total_line = Some(row.line);
        }
        self.close_org();
        self.state = ParserState::Ready;
    }

    fn on_org_unit(&mut self, row: &RawRow, classification: Classification) {
        self.close_org();
        let (code, name) = self.identity(row, classification);
        let totals = self.read_values(row, RowType::OrgUnitHeader, ValueLevel::OrgUnit);
        let block = self.diagnostics.org_unit_blocks;
        self.diagnostics.org_unit_blocks += 1;
        debug!(line = row.line, block, "org unit block opened");
        self.org = Some(OrgContext {
            block,
            line: row.line,
            code,
            name,
            totals,
            programs: 0,
        });
        self.state = ParserState::InOrgUnit;
    }

    fn on_program(&mut self, row: &RawRow, classification: Classification) {
        if !self.state.inside_org_unit() {
            self.anomaly(
                row,
                RowType::ProgramHeader,
                AnomalyKind::ProgramOutsideOrgUnit,
                "program header outside any org unit".to_string(),
            );
            return;
        }
        let (code, name) = self.identity(row, classification);
        match self.depth {
            HierarchyDepth::Three => {
                self.close_program();
                let totals = self.read_values(row, RowType::ProgramHeader, ValueLevel::Program);
                let block = self.open_program_block();
                self.program = Some(ProgramContext {
                    block,
                    line: row.line,
                    code,
                    name,
                    totals,
                    subprograms: 0,
                });
            }
            HierarchyDepth::Two => {
                let values = self.read_values(row, RowType::ProgramHeader, ValueLevel::Leaf);
                self.emit_program_leaf(row.line, code, name, values);
            }
        }
        self.state = ParserState::InProgram;
    }

    fn on_data_row(&mut self, row: &RawRow) {
        if !self.state.inside_org_unit() {
            self.anomaly(
                row,
                RowType::SubprogramRow,
                AnomalyKind::RowOutsideOrgUnit,
                "data row outside any org unit; kept in diagnostics only".to_string(),
            );
            return;
        }
        let (code, name) = self.identity(row, Classification {
            row_type: RowType::SubprogramRow,
            label: None,
        });
        let values = self.read_values(row, RowType::SubprogramRow, ValueLevel::Leaf);
        match (self.depth, self.state) {
            (HierarchyDepth::Two, _) => {
                self.emit_program_leaf(row.line, code, name, values);
                self.state = ParserState::InProgram;
            }
            (HierarchyDepth::Three, ParserState::InOrgUnit) => {
                self.anomaly(
                    row,
                    RowType::SubprogramRow,
                    AnomalyKind::RowOutsideProgram,
                    "data row before any program; emitted without program context".to_string(),
                );
                self.emit_subprogram(row.line, code, name, values);
            }
            (HierarchyDepth::Three, _) => {
                self.emit_subprogram(row.line, code, name, values);
                self.state = ParserState::InSubprogram;
            }
        }
    }

    fn open_program_block(&mut self) -> usize {
        let block = self.diagnostics.program_blocks;
        self.diagnostics.program_blocks += 1;
        if let Some(org) = self.org.as_mut() {
            org.programs += 1;
        }
        block
    }

    /// Close the open program. A 3-level program without subprograms
    /// becomes a program-level record holding its own totals.
    fn close_program(&mut self) {
        let Some(program) = self.program.take() else {
            return;
        };
        if program.subprograms > 0 {
            return;
        }
        let Some(org) = &self.org else {
            return;
        };
        debug!(line = program.line, "program without subprograms kept as a leaf");
        self.records.push(FlatRecord {
            line: program.line,
            level: RecordLevel::Program,
            org_block: org.block,
            program_block: Some(program.block),
            org_unit_line: org.line,
            program_line: Some(program.line),
            org_unit_code: org.code.clone(),
            org_unit_name: org.name.clone(),
            program_code: program.code,
            program_name: program.name,
            subprogram_code: None,
            subprogram_name: None,
            values: program.totals.clone(),
            org_unit_totals: org.totals.clone(),
            program_totals: program.totals,
        });
    }

    fn close_org(&mut self) {
        self.close_program();
        if let Some(org) = self.org.take()
            && org.programs == 0
        {
            self.diagnostics.empty_org_units += 1;
        }
    }

    fn emit_program_leaf(
        &mut self,
        line: usize,
        code: Option<String>,
        name: String,
        values: FieldValues,
    ) {
        let block = self.open_program_block();
        let Some(org) = &self.org else {
            return;
        };
        self.records.push(FlatRecord {
            line,
            level: RecordLevel::Program,
            org_block: org.block,
            program_block: Some(block),
            org_unit_line: org.line,
            program_line: Some(line),
            org_unit_code: org.code.clone(),
            org_unit_name: org.name.clone(),
            program_code: code,
            program_name: name,
            subprogram_code: None,
            subprogram_name: None,
            program_totals: values.clone(),
            values,
            org_unit_totals: org.totals.clone(),
        });
    }

    fn emit_subprogram(
        &mut self,
        line: usize,
        code: Option<String>,
        name: String,
        values: FieldValues,
    ) {
        let Some(org) = &self.org else {
            return;
        };
        let (program_block, program_line, program_code, program_name, program_totals) =
            match &self.program {
                Some(program) => (
                    Some(program.block),
                    Some(program.line),
                    program.code.clone(),
                    program.name.clone(),
                    program.totals.clone(),
                ),
                None => (None, None, None, String::new(), FieldValues::new()),
            };
        self.records.push(FlatRecord {
            line,
            level: RecordLevel::Subprogram,
            org_block: org.block,
            program_block,
            org_unit_line: org.line,
            program_line,
            org_unit_code: org.code.clone(),
            org_unit_name: org.name.clone(),
            program_code,
            program_name,
            subprogram_code: code,
            subprogram_name: Some(name),
            values,
            org_unit_totals: org.totals.clone(),
            program_totals,
        });
        if let Some(program) = self.program.as_mut() {
            program.subprograms += 1;
        }
    }

    fn identity(&self, row: &RawRow, classification: Classification) -> (Option<String>, String) {
        let label = classification
            .label
            .map(|(kind, id)| self.classifier.matcher().set(kind).words(id))
            .unwrap_or_default();
        header_identity(row, self.classifier, label)
    }

    fn read_values(&mut self, row: &RawRow, row_type: RowType, level: ValueLevel) -> FieldValues {
        let mut values = FieldValues::new();
        for index in 0..self.fields.len() {
            let (name, columns) = self.fields[index];
            if let Some(column) = level.column(&columns) {
                let value = self.read_cell(row, row_type, name, column);
                values.insert(name, value);
            }
        }
        values
    }

    /// Grand totals are read from the most aggregated column that holds
    /// anything.
    fn read_grand_total(&mut self, row: &RawRow) -> FieldValues {
        let mut values = FieldValues::new();
        for index in 0..self.fields.len() {
            let (name, columns) = self.fields[index];
            let column = columns
                .total_candidates()
                .find(|&column| cell_amount(row.cell(column)) != Amount::Empty)
                .or_else(|| columns.total_candidates().next());
            if let Some(column) = column {
                let value = self.read_cell(row, RowType::GrandTotal, name, column);
                values.insert(name, value);
            }
        }
        values
    }

    fn read_cell(
        &mut self,
        row: &RawRow,
        row_type: RowType,
        field: &str,
        column: usize,
    ) -> Option<f64> {
        match cell_amount(row.cell(column)) {
            Amount::Value(value) => Some(value),
            Amount::Grouped(value) => {
                let message = format!(
                    "{field}: column {column} has a lone separator before three digits; \
                     read as {value}"
                );
                self.anomaly(row, row_type, AnomalyKind::AmbiguousSeparator, message);
                Some(value)
            }
            Amount::Empty => None,
            Amount::Malformed => {
                let message = format!("{field}: column {column} is not a number; stored as null");
                self.anomaly(row, row_type, AnomalyKind::CoercedCell, message);
                None
            }
        }
    }

    fn anomaly(&mut self, row: &RawRow, row_type: RowType, kind: AnomalyKind, message: String) {
        debug!(
            line = row.line,
            kind = %kind,
            state = %self.state,
            row_type = %row_type,
            detail = %message,
            "row anomaly"
        );
        self.diagnostics.push(Anomaly {
            line: row.line,
            kind,
            row_type,
            state: self.state,
            message,
            cells: row.preview(),
        });
    }
}

/// Reconstruct a whole worksheet.
pub fn reconstruct(
    rows: &[RawRow],
    classifier: &RowClassifier,
    source: SourceType,
    year: Option<u16>,
) -> Result<ParsedTable> {
    let mut reconstructor = HierarchyReconstructor::new(classifier, source, year);
    for row in rows {
        reconstructor.push(row);
    }
    reconstructor.finish()
}

/// Split a row into code and name, dropping a leading header label.
///
/// Handles both layouts seen in ledgers: code and name in their own
/// columns, or everything in one cell (`Programa Nº 16 - Atención`).
fn header_identity(
    row: &RawRow,
    classifier: &RowClassifier,
    label: &[String],
) -> (Option<String>, String) {
    let layout = classifier.layout();
    let code_text = strip_label(&row.cell(layout.code_column).display_text(), label);
    let name_text = if layout.name_column == layout.code_column {
        String::new()
    } else {
        strip_label(&row.cell(layout.name_column).display_text(), label)
    };
    match (code_text.is_empty(), name_text.is_empty()) {
        (_, true) => split_code(&code_text),
        (true, false) => split_code(&name_text),
        (false, false) => {
            let (code, rest) = split_code(&code_text);
            let name = [rest, name_text]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (code, name)
        }
    }
}

/// Remove `label` from the start of `text`, token by token.
fn strip_label(text: &str, label: &[String]) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if label.is_empty() {
        return tokens.join(" ");
    }
    let mut matched = 0;
    let mut index = 0;
    while index < tokens.len() && matched < label.len() {
        let normalized = normalize_label(tokens[index]);
        if normalized.is_empty() {
            index += 1;
            continue;
        }
        let words: Vec<&str> = normalized.split(' ').collect();
        let fits = words.len() <= label.len() - matched
            && words
                .iter()
                .zip(&label[matched..])
                .all(|(word, expected)| *word == expected.as_str());
        if !fits {
            break;
        }
        matched += words.len();
        index += 1;
    }
    if matched < label.len() {
        return tokens.join(" ");
    }
    // Number markers such as `Nº` or `Nro.` after the label.
    while index < tokens.len()
        && matches!(normalize_label(tokens[index]).as_str(), "" | "n" | "nro")
    {
        index += 1;
    }
    tokens[index..].join(" ")
}

/// Take a leading token containing a digit as the code.
fn split_code(text: &str) -> (Option<String>, String) {
    let mut tokens = text.split_whitespace().peekable();
    let code = tokens
        .next_if(|token| token.chars().any(|ch| ch.is_ascii_digit()))
        .map(|token| {
            token
                .trim_matches(|ch: char| matches!(ch, ':' | '.' | ',' | '-' | '–' | '—'))
                .to_string()
        })
        .filter(|code| !code.is_empty());
    let rest: Vec<&str> = tokens
        .skip_while(|token| normalize_label(token).is_empty())
        .collect();
    (code, rest.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn strips_label_and_number_marker() {
        assert_eq!(
            strip_label("Programa Nº 16 - Atención", &words(&["programa"])),
            "16 - Atención"
        );
        assert_eq!(
            strip_label("UNIDAD RESPONSABLE: 101", &words(&["unidad", "responsable"])),
            "101"
        );
        assert_eq!(strip_label("Salud pública", &words(&["programa"])), "Salud pública");
    }

    #[test]
    fn splits_leading_code() {
        assert_eq!(
            split_code("16 - Atención primaria"),
            (Some("16".to_string()), "Atención primaria".to_string())
        );
        assert_eq!(
            split_code("Atención primaria"),
            (None, "Atención primaria".to_string())
        );
        assert_eq!(split_code("101:"), (Some("101".to_string()), String::new()));
    }
}
