//! Row classification.

use budget_model::{
    ColumnLayout, LabelKind, LedgerConfig, ParserState, RawRow, RowType, SourceType,
};
use tracing::trace;

use crate::matcher::{LabelMatcher, PatternId, normalize_label};
use crate::numeric::cell_amount;

/// Row type plus the label pattern that decided it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub row_type: RowType,
    pub label: Option<(LabelKind, PatternId)>,
}

/// Classifies raw rows using label patterns and column positions.
#[derive(Debug, Clone)]
pub struct RowClassifier {
    matcher: LabelMatcher,
    layout: ColumnLayout,
    leaf_columns: Vec<usize>,
}

impl RowClassifier {
    pub fn new(matcher: LabelMatcher, layout: ColumnLayout) -> Self {
        let leaf_columns = layout.leaf_columns();
        Self {
            matcher,
            layout,
            leaf_columns,
        }
    }

    /// Classifier with the labels and layout configured for a source and year.
    pub fn for_source(config: &LedgerConfig, source: SourceType, year: Option<u16>) -> Self {
        let labels = config.labels_for(source, year);
        Self::new(
            LabelMatcher::new(&labels, config.label_tolerance),
            config.layout_for(source),
        )
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn matcher(&self) -> &LabelMatcher {
        &self.matcher
    }

    pub fn classify(&self, row: &RawRow, state: ParserState) -> RowType {
        self.inspect(row, state).row_type
    }

    /// Classify a row, keeping the matched label.
    ///
    /// Decision order: grand total label; org unit label with no number in
    /// any leaf column; program label; identifier plus a number in a leaf
    /// column; noise. The state does not change the outcome.
    pub fn inspect(&self, row: &RawRow, state: ParserState) -> Classification {
        let classification = self.decide(row);
        trace!(
            line = row.line,
            state = %state,
            row_type = %classification.row_type,
            "classified row"
        );
        classification
    }

    fn decide(&self, row: &RawRow) -> Classification {
        let text = normalize_label(&row.joined_text(&self.layout.label_columns));
        let labelled = |kind: LabelKind, row_type: RowType| {
            self.matcher.find(kind, &text).map(|id| Classification {
                row_type,
                label: Some((kind, id)),
            })
        };

        if let Some(found) = labelled(LabelKind::GrandTotal, RowType::GrandTotal) {
            return found;
        }
        let has_leaf_number = self.has_leaf_number(row);
        if !has_leaf_number
            && let Some(found) = labelled(LabelKind::OrgUnit, RowType::OrgUnitHeader)
        {
            return found;
        }
        if let Some(found) = labelled(LabelKind::Program, RowType::ProgramHeader) {
            return found;
        }
        let row_type = if self.has_identifier(row) && has_leaf_number {
            RowType::SubprogramRow
        } else {
            RowType::Noise
        };
        Classification {
            row_type,
            label: None,
        }
    }

    fn has_leaf_number(&self, row: &RawRow) -> bool {
        self.leaf_columns
            .iter()
            .any(|&column| cell_amount(row.cell(column)).is_value())
    }

    fn has_identifier(&self, row: &RawRow) -> bool {
        !row.cell(self.layout.code_column).is_empty()
            || !row.cell(self.layout.name_column).is_empty()
    }
}
