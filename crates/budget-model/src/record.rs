//! Flat output records and the independently reported grand total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field-keyed values.
///
/// An absent key means the field's column was not present in the source; a
/// present key with `None` means the cell was empty or could not be read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, Option<f64>>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<f64>) {
        self.0.insert(field.into(), value);
    }

    /// Whether the field was extracted at all.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Value of the field, `None` when absent or missing.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied().flatten()
    }

    /// Raw entry: `None` when absent, `Some(None)` when missing.
    pub fn entry(&self, field: &str) -> Option<Option<f64>> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<(S, Option<f64>)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (S, Option<f64>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}

/// Hierarchy level a record's own values belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLevel {
    /// Program leaf: 2-level tables, or a 3-level program without subprograms.
    Program,
    /// Subprogram leaf of a 3-level table.
    Subprogram,
}

/// One reconstructed leaf row with its inherited parent context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    /// Source line the record was read from.
    pub line: usize,
    pub level: RecordLevel,
    /// Sequence number of the org unit block, in encounter order.
    pub org_block: usize,
    /// Sequence number of the program block, in encounter order.
    pub program_block: Option<usize>,
    /// Source line of the org unit header.
    pub org_unit_line: usize,
    /// Source line of the program header; a program leaf's own line.
    pub program_line: Option<usize>,
    pub org_unit_code: Option<String>,
    pub org_unit_name: String,
    pub program_code: Option<String>,
    pub program_name: String,
    pub subprogram_code: Option<String>,
    pub subprogram_name: Option<String>,
    pub values: FieldValues,
    /// Org unit totals as printed on the org unit header.
    pub org_unit_totals: FieldValues,
    /// Program totals as printed on the program header.
    pub program_totals: FieldValues,
}

impl FlatRecord {
    /// Human-readable path used in validation messages.
    pub fn entity_path(&self) -> String {
        let mut parts = vec![describe(self.org_unit_code.as_deref(), &self.org_unit_name)];
        if self.program_block.is_some() || !self.program_name.is_empty() {
            parts.push(describe(self.program_code.as_deref(), &self.program_name));
        }
        if self.level == RecordLevel::Subprogram {
            parts.push(describe(
                self.subprogram_code.as_deref(),
                self.subprogram_name.as_deref().unwrap_or_default(),
            ));
        }
        parts.join(" / ")
    }
}

/// Formats `code name`, falling back to a placeholder when both are blank.
pub fn describe(code: Option<&str>, name: &str) -> String {
    match (code.map(str::trim).filter(|c| !c.is_empty()), name.trim()) {
        (Some(code), "") => code.to_string(),
        (Some(code), name) => format!("{code} {name}"),
        (None, "") => "(unnamed)".to_string(),
        (None, name) => name.to_string(),
    }
}

/// Grand total printed in the source, independent of the flat records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrandTotalSummary {
    /// Source line of the grand total row.
    pub line: usize,
    pub values: FieldValues,
}
