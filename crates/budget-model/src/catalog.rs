//! Static field catalog per source type.
//!
//! The catalog is shared by the reconstructor (which columns to extract) and
//! the validator (which fields are mandatory, which are amounts that must add
//! up, which are percentages that must match their operands).

use serde::Serialize;

use crate::source::{HierarchyDepth, SourceFamily, SourceType};

/// Field names, shared between the catalog, the layouts and the checks.
pub mod fields {
    pub const INITIAL_CREDIT: &str = "initial_credit";
    pub const ANNUAL_CREDIT: &str = "annual_credit";
    pub const PERIOD_EXECUTION: &str = "period_execution";
    pub const EXECUTION_PCT: &str = "execution_pct";
    pub const PROJECTION_Y1: &str = "projection_y1";
    pub const PROJECTION_Y2: &str = "projection_y2";
    pub const PROJECTION_Y3: &str = "projection_y3";
}

/// What kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Currency amount; participates in hierarchical sums.
    Amount,
    /// Percentage (0-100 scale) reported as `numerator / denominator * 100`.
    Percentage {
        numerator: &'static str,
        denominator: &'static str,
    },
}

/// One catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn amount(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Amount,
            required: true,
        }
    }

    pub fn is_amount(&self) -> bool {
        matches!(self.kind, FieldKind::Amount)
    }

    pub fn is_percentage(&self) -> bool {
        matches!(self.kind, FieldKind::Percentage { .. })
    }
}

/// Period figure compared against its annual counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodPair {
    pub period: &'static str,
    pub annual: &'static str,
}

/// Catalog entry for a source family.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceSchema {
    pub family: SourceFamily,
    pub depth: HierarchyDepth,
    pub fields: &'static [FieldSpec],
    pub period_pair: Option<PeriodPair>,
}

impl SourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn amount_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.is_amount())
    }

    pub fn percentage_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.is_percentage())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.required)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }
}

const LAW_FIELDS: &[FieldSpec] = &[FieldSpec::amount(fields::INITIAL_CREDIT, "Initial credit")];

const EXECUTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::amount(fields::ANNUAL_CREDIT, "Annual credit"),
    FieldSpec::amount(fields::PERIOD_EXECUTION, "Executed in period"),
    FieldSpec {
        name: fields::EXECUTION_PCT,
        label: "Execution %",
        kind: FieldKind::Percentage {
            numerator: fields::PERIOD_EXECUTION,
            denominator: fields::ANNUAL_CREDIT,
        },
        required: true,
    },
];

const PLAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::amount(fields::PROJECTION_Y1, "Projected year 1"),
    FieldSpec::amount(fields::PROJECTION_Y2, "Projected year 2"),
    FieldSpec::amount(fields::PROJECTION_Y3, "Projected year 3"),
];

static LAW_SCHEMA: SourceSchema = SourceSchema {
    family: SourceFamily::Law,
    depth: HierarchyDepth::Three,
    fields: LAW_FIELDS,
    period_pair: None,
};

static EXECUTION_SCHEMA: SourceSchema = SourceSchema {
    family: SourceFamily::Execution,
    depth: HierarchyDepth::Three,
    fields: EXECUTION_FIELDS,
    period_pair: Some(PeriodPair {
        period: fields::PERIOD_EXECUTION,
        annual: fields::ANNUAL_CREDIT,
    }),
};

static PLAN_SCHEMA: SourceSchema = SourceSchema {
    family: SourceFamily::Plan,
    depth: HierarchyDepth::Two,
    fields: PLAN_FIELDS,
    period_pair: None,
};

/// Catalog entry for a source type.
pub fn schema_for(source: SourceType) -> &'static SourceSchema {
    match source.family() {
        SourceFamily::Law => &LAW_SCHEMA,
        SourceFamily::Execution => &EXECUTION_SCHEMA,
        SourceFamily::Plan => &PLAN_SCHEMA,
    }
}
