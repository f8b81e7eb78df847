//! Error types for worksheet parsing.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::ParseDiagnostics;

/// Why a worksheet could not be reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralFailure {
    /// No row matched a grand total label.
    MissingGrandTotal,
    /// The worksheet produced no records.
    NoRecords,
}

impl fmt::Display for StructuralFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGrandTotal => f.write_str("no grand total row found"),
            Self::NoRecords => f.write_str("no records produced"),
        }
    }
}

/// Errors raised while reading or reconstructing a worksheet.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The worksheet does not have the expected structure. Aborts this
    /// worksheet only; diagnostics are preserved.
    #[error("structural failure: {reason}")]
    Structural {
        reason: StructuralFailure,
        diagnostics: Box<ParseDiagnostics>,
    },

    #[error("failed to read worksheet {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ParseError {
    /// Diagnostics gathered before a structural failure.
    pub fn diagnostics(&self) -> Option<&ParseDiagnostics> {
        match self {
            Self::Structural { diagnostics, .. } => Some(diagnostics),
            Self::Io { .. } | Self::Csv { .. } => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
