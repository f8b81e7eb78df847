//! Parse diagnostics: counters, transitions and anomalies.

use std::collections::BTreeMap;
use std::fmt;

use budget_model::{ParserState, RowType};
use serde::Serialize;

/// Kind of a non-fatal classification anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Program header before any org unit.
    ProgramOutsideOrgUnit,
    /// Data row before any org unit. No record is emitted for it; the
    /// anomaly keeps the row's cells, which is the only place it survives.
    RowOutsideOrgUnit,
    /// Data row inside an org unit but before any program; emitted with a
    /// null program context.
    RowOutsideProgram,
    /// Grand total seen more than once; the first one is kept.
    SecondSummary,
    /// Value cell that could not be read as a number; stored as null.
    CoercedCell,
    /// Value cell with a lone separator before three digits, read as
    /// thousands grouping.
    AmbiguousSeparator,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProgramOutsideOrgUnit => "program_outside_org_unit",
            Self::RowOutsideOrgUnit => "row_outside_org_unit",
            Self::RowOutsideProgram => "row_outside_program",
            Self::SecondSummary => "second_summary",
            Self::CoercedCell => "coerced_cell",
            Self::AmbiguousSeparator => "ambiguous_separator",
        }
    }

    /// Raised for one cell rather than for the row's place in the hierarchy.
    pub fn is_cell_level(self) -> bool {
        matches!(self, Self::CoercedCell | Self::AmbiguousSeparator)
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One anomaly with the row it was raised on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub line: usize,
    pub kind: AnomalyKind,
    pub row_type: RowType,
    /// Reconstructor state when the row was read.
    pub state: ParserState,
    pub message: String,
    /// Display text of every cell of the row.
    pub cells: Vec<String>,
}

/// Everything the reconstructor observed while reading one worksheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParseDiagnostics {
    pub rows_seen: usize,
    /// Row count per row type.
    pub row_types: BTreeMap<String, usize>,
    /// Row count per state transition, keyed `"From -> To"`.
    pub transitions: BTreeMap<String, usize>,
    /// Anomalies in row order.
    pub anomalies: Vec<Anomaly>,
    pub coerced_cells: usize,
    pub org_unit_blocks: usize,
    pub program_blocks: usize,
    /// Org units closed without any program.
    pub empty_org_units: usize,
    pub records: usize,
    pub grand_total_line: Option<usize>,
}

impl ParseDiagnostics {
    pub(crate) fn count_row(&mut self, row_type: RowType) {
        self.rows_seen += 1;
        *self.row_types.entry(row_type.as_str().to_string()).or_default() += 1;
    }

    pub(crate) fn count_transition(&mut self, from: ParserState, to: ParserState) {
        *self.transitions.entry(format!("{from} -> {to}")).or_default() += 1;
    }

    pub(crate) fn push(&mut self, anomaly: Anomaly) {
        if anomaly.kind == AnomalyKind::CoercedCell {
            self.coerced_cells += 1;
        }
        self.anomalies.push(anomaly);
    }

    pub fn row_type_count(&self, row_type: RowType) -> usize {
        self.row_types.get(row_type.as_str()).copied().unwrap_or(0)
    }

    pub fn transition_count(&self, from: ParserState, to: ParserState) -> usize {
        self.transitions
            .get(&format!("{from} -> {to}"))
            .copied()
            .unwrap_or(0)
    }

    /// Anomalies about the row's place in the hierarchy.
    pub fn classification_anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.anomalies
            .iter()
            .filter(|anomaly| !anomaly.kind.is_cell_level())
    }

    pub fn anomaly_count(&self, kind: AnomalyKind) -> usize {
        self.anomalies.iter().filter(|a| a.kind == kind).count()
    }
}
