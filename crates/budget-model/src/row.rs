//! Raw worksheet rows and the classification vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single worksheet cell as delivered by the spreadsheet reader.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a cell from raw text, treating blank text as empty.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches('\u{feff}');
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Text content, if this is a non-blank text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        }
    }

    /// Cell content rendered as display text (numbers without trailing zeros).
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.trim().to_string(),
            CellValue::Number(value) => format_number(*value),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// One worksheet line: its 1-based line number and its cells in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(line: usize, cells: Vec<CellValue>) -> Self {
        Self { line, cells }
    }

    /// Cell at `index`; out-of-range columns read as empty.
    pub fn cell(&self, index: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(index).unwrap_or(&EMPTY)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.cell(index).as_text()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }

    /// Joined display text of the given columns, skipping blanks.
    pub fn joined_text(&self, columns: &[usize]) -> String {
        columns
            .iter()
            .map(|&index| self.cell(index).display_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Display text of every cell, for diagnostics.
    pub fn preview(&self) -> Vec<String> {
        self.cells.iter().map(CellValue::display_text).collect()
    }
}

/// Classification of one raw row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RowType {
    GrandTotal,
    OrgUnitHeader,
    ProgramHeader,
    SubprogramRow,
    Noise,
}

impl RowType {
    pub const ALL: [RowType; 5] = [
        Self::GrandTotal,
        Self::OrgUnitHeader,
        Self::ProgramHeader,
        Self::SubprogramRow,
        Self::Noise,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GrandTotal => "GrandTotal",
            Self::OrgUnitHeader => "OrgUnitHeader",
            Self::ProgramHeader => "ProgramHeader",
            Self::SubprogramRow => "SubprogramRow",
            Self::Noise => "Noise",
        }
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the hierarchy reconstructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ParserState {
    #[default]
    Init,
    Ready,
    InOrgUnit,
    InProgram,
    InSubprogram,
}

impl ParserState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Ready => "Ready",
            Self::InOrgUnit => "InOrgUnit",
            Self::InProgram => "InProgram",
            Self::InSubprogram => "InSubprogram",
        }
    }

    /// True once an org unit block is open.
    pub fn inside_org_unit(self) -> bool {
        matches!(self, Self::InOrgUnit | Self::InProgram | Self::InSubprogram)
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
