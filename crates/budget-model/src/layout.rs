//! Column layouts for stepped ledger worksheets.
//!
//! Budget ledgers indent their figures by column: a leaf row prints its value
//! in the leaf column of a field, a program header prints the program total one
//! step further right, and an org unit header prints its total in the org unit
//! column. The layout records those positions per field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::fields;
use crate::source::{HierarchyDepth, SourceFamily, SourceType};

/// Column positions of one field at each hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldColumns {
    /// Column holding leaf values (subprograms, or programs in 2-level tables).
    pub leaf: Option<usize>,
    /// Column holding program totals. Unused in 2-level tables.
    #[serde(default)]
    pub program: Option<usize>,
    /// Column holding org unit totals.
    pub org_unit: Option<usize>,
}

impl FieldColumns {
    pub const fn stepped(leaf: usize, program: usize, org_unit: usize) -> Self {
        Self {
            leaf: Some(leaf),
            program: Some(program),
            org_unit: Some(org_unit),
        }
    }

    pub const fn two_level(leaf: usize, org_unit: usize) -> Self {
        Self {
            leaf: Some(leaf),
            program: None,
            org_unit: Some(org_unit),
        }
    }

    /// Columns to try for a grand total, most aggregated first.
    pub fn total_candidates(&self) -> impl Iterator<Item = usize> {
        [self.org_unit, self.program, self.leaf].into_iter().flatten()
    }
}

/// Where identifiers, labels and values live in a worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnLayout {
    pub code_column: usize,
    pub name_column: usize,
    /// Columns whose joined text is matched against label patterns.
    pub label_columns: Vec<usize>,
    /// Column positions per catalog field name.
    pub fields: BTreeMap<String, FieldColumns>,
}

impl ColumnLayout {
    /// Built-in layout for a source type.
    pub fn default_for(source: SourceType) -> Self {
        let fields = match source.family() {
            SourceFamily::Law => vec![(fields::INITIAL_CREDIT, FieldColumns::stepped(2, 3, 4))],
            SourceFamily::Execution => vec![
                (fields::ANNUAL_CREDIT, FieldColumns::stepped(2, 5, 8)),
                (fields::PERIOD_EXECUTION, FieldColumns::stepped(3, 6, 9)),
                (fields::EXECUTION_PCT, FieldColumns::stepped(4, 7, 10)),
            ],
            SourceFamily::Plan => vec![
                (fields::PROJECTION_Y1, FieldColumns::two_level(2, 5)),
                (fields::PROJECTION_Y2, FieldColumns::two_level(3, 6)),
                (fields::PROJECTION_Y3, FieldColumns::two_level(4, 7)),
            ],
        };
        let mut layout = Self {
            code_column: 0,
            name_column: 1,
            label_columns: vec![0, 1],
            fields: fields
                .into_iter()
                .map(|(name, columns)| (name.to_string(), columns))
                .collect(),
        };
        if source.depth() == HierarchyDepth::Two {
            for columns in layout.fields.values_mut() {
                columns.program = None;
            }
        }
        layout
    }

    pub fn columns_for(&self, field: &str) -> Option<&FieldColumns> {
        self.fields.get(field)
    }

    /// Every leaf value column, in field order.
    pub fn leaf_columns(&self) -> Vec<usize> {
        self.fields.values().filter_map(|columns| columns.leaf).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema_for;

    #[test]
    fn defaults_cover_every_catalog_field() {
        for source in SourceType::all() {
            let layout = ColumnLayout::default_for(source);
            for field in schema_for(source).fields {
                assert!(
                    layout.columns_for(field.name).is_some(),
                    "{source}: no columns for {}",
                    field.name
                );
            }
        }
    }

    #[test]
    fn plan_layout_has_no_program_columns() {
        let layout = ColumnLayout::default_for(SourceType::MediumTermPlan);
        assert!(layout.fields.values().all(|columns| columns.program.is_none()));
    }

    #[test]
    fn grand_total_candidates_prefer_org_unit_column() {
        let columns = FieldColumns::stepped(2, 3, 4);
        assert_eq!(columns.total_candidates().collect::<Vec<_>>(), vec![4, 3, 2]);
    }
}
