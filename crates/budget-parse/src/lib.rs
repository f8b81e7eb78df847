//! Budget ledger worksheet parsing.
//!
//! Rows flow through the [`RowClassifier`] (label patterns plus column
//! positions) into the [`HierarchyReconstructor`], which rebuilds the
//! org unit, program and subprogram hierarchy as flat records.

pub mod classify;
pub mod diagnostics;
pub mod error;
pub mod matcher;
pub mod numeric;
pub mod reconstruct;
pub mod worksheet;

use budget_model::{LedgerConfig, RawRow, SourceType};

pub use classify::{Classification, RowClassifier};
pub use diagnostics::{Anomaly, AnomalyKind, ParseDiagnostics};
pub use error::{ParseError, Result, StructuralFailure};
pub use matcher::{LabelMatcher, LabelSet, PatternId, classify_label, normalize_label};
pub use numeric::{Amount, cell_amount, parse_amount};
pub use reconstruct::{HierarchyReconstructor, ParsedTable, reconstruct};
pub use worksheet::{WorksheetOptions, read_worksheet, read_worksheet_from};

/// Parse one worksheet with the labels and layout configured for its source.
pub fn parse_rows(
    rows: &[RawRow],
    source: SourceType,
    year: Option<u16>,
    config: &LedgerConfig,
) -> Result<ParsedTable> {
    let classifier = RowClassifier::for_source(config, source, year);
    reconstruct(rows, &classifier, source, year)
}
