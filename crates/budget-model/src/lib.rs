//! Data model shared by the budget ledger parser, validator and CLI.

pub mod catalog;
pub mod config;
pub mod conformance;
pub mod error;
pub mod layout;
pub mod record;
pub mod row;
pub mod source;

pub use catalog::{FieldKind, FieldSpec, PeriodPair, SourceSchema, fields, schema_for};
pub use config::{
    FamilyConfig, LabelKind, LabelPatterns, LedgerConfig, SeverityOverride, Tolerances,
    YearOverride,
};
pub use conformance::{
    CheckId, CheckResult, Finding, HierarchyLevel, ReportMetadata, ReportSummary, Severity,
    ValidationReport,
};
pub use error::{ConfigError, Result};
pub use layout::{ColumnLayout, FieldColumns};
pub use record::{FieldValues, FlatRecord, GrandTotalSummary, RecordLevel, describe};
pub use row::{CellValue, ParserState, RawRow, RowType};
pub use source::{HierarchyDepth, ReportPeriod, SourceFamily, SourceType};
