//! Block view over a flat record set.
//!
//! Records carry their parents' printed totals, so the same org unit or
//! program total appears on every record below it. The view regroups
//! records by block sequence number so each printed total is seen once.
//! Blocks are never unified by code: an org unit split across two places
//! in the worksheet stays two blocks.

use std::collections::HashMap;

use budget_model::{FieldValues, FlatRecord, RecordLevel, describe};

/// One program block and the leaves under it.
#[derive(Debug, Clone)]
pub struct ProgramBlock<'a> {
    pub block: usize,
    /// Source line of the program header.
    pub line: Option<usize>,
    pub code: Option<&'a str>,
    pub name: &'a str,
    /// Totals printed on the program header, or the program's own values
    /// when it is a leaf.
    pub totals: &'a FieldValues,
    /// The program itself, when it has no subprograms.
    pub leaf: Option<&'a FlatRecord>,
    pub subprograms: Vec<&'a FlatRecord>,
}

impl ProgramBlock<'_> {
    pub fn label(&self) -> String {
        describe(self.code, self.name)
    }
}

/// One org unit block with its programs and program-less leaves.
#[derive(Debug, Clone)]
pub struct OrgBlock<'a> {
    pub block: usize,
    /// Source line of the org unit header.
    pub line: usize,
    pub code: Option<&'a str>,
    pub name: &'a str,
    pub totals: &'a FieldValues,
    pub programs: Vec<ProgramBlock<'a>>,
    /// Subprogram records read before any program header.
    pub orphans: Vec<&'a FlatRecord>,
}

impl OrgBlock<'_> {
    pub fn label(&self) -> String {
        describe(self.code, self.name)
    }

    /// Entity path of a program inside this block.
    pub fn program_path(&self, program: &ProgramBlock<'_>) -> String {
        format!("{} / {}", self.label(), program.label())
    }

    /// Values that add up to this block's totals: program totals plus
    /// orphan leaves.
    pub fn child_totals(&self) -> impl Iterator<Item = &FieldValues> {
        self.programs
            .iter()
            .map(|program| program.totals)
            .chain(self.orphans.iter().map(|record| &record.values))
    }
}

/// Org unit blocks in encounter order.
#[derive(Debug, Clone, Default)]
pub struct HierarchyView<'a> {
    pub org_units: Vec<OrgBlock<'a>>,
}

impl<'a> HierarchyView<'a> {
    pub fn build(records: &'a [FlatRecord]) -> Self {
        let mut org_units: Vec<OrgBlock<'a>> = Vec::new();
        let mut org_index: HashMap<usize, usize> = HashMap::new();
        let mut program_index: HashMap<usize, usize> = HashMap::new();

        for record in records {
            let org_position = *org_index.entry(record.org_block).or_insert_with(|| {
                org_units.push(OrgBlock {
                    block: record.org_block,
                    line: record.org_unit_line,
                    code: record.org_unit_code.as_deref(),
                    name: &record.org_unit_name,
                    totals: &record.org_unit_totals,
                    programs: Vec::new(),
                    orphans: Vec::new(),
                });
                org_units.len() - 1
            });
            let org = &mut org_units[org_position];

            let Some(block) = record.program_block else {
                org.orphans.push(record);
                continue;
            };
            let position = *program_index.entry(block).or_insert_with(|| {
                org.programs.push(ProgramBlock {
                    block,
                    line: record.program_line,
                    code: record.program_code.as_deref(),
                    name: &record.program_name,
                    totals: &record.program_totals,
                    leaf: None,
                    subprograms: Vec::new(),
                });
                org.programs.len() - 1
            });
            let program = &mut org.programs[position];
            match record.level {
                RecordLevel::Program => program.leaf = Some(record),
                RecordLevel::Subprogram => program.subprograms.push(record),
            }
        }

        Self { org_units }
    }

    pub fn programs(&self) -> impl Iterator<Item = (&OrgBlock<'a>, &ProgramBlock<'a>)> {
        self.org_units
            .iter()
            .flat_map(|org| org.programs.iter().map(move |program| (org, program)))
    }

    pub fn program_count(&self) -> usize {
        self.org_units.iter().map(|org| org.programs.len()).sum()
    }
}
