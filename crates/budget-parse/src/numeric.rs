//! Amount coercion for ledger cells.
//!
//! Ledgers mix native numeric cells with text such as `1.234.567,89`,
//! `(1,500)` for negatives, trailing `%` on percentages and dash
//! placeholders for "nothing to report".
//!
//! A lone `.` or `,` followed by exactly three digits reads either way
//! (`2.000`, `1,500`). Both separators resolve the same: grouping when the
//! integer part is non-zero, decimal otherwise. The reader gets
//! [`Amount::Grouped`] so it can record the guess.

use budget_model::CellValue;

/// Result of reading a value cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    /// Blank or placeholder cell.
    Empty,
    Value(f64),
    /// Value read with a lone separator as thousands grouping; the text
    /// also reads as a decimal.
    Grouped(f64),
    /// Non-blank cell that is not a number.
    Malformed,
}

impl Amount {
    pub fn value(self) -> Option<f64> {
        match self {
            Amount::Value(value) | Amount::Grouped(value) => Some(value),
            Amount::Empty | Amount::Malformed => None,
        }
    }

    pub fn is_value(self) -> bool {
        matches!(self, Amount::Value(_) | Amount::Grouped(_))
    }
}

const PLACEHOLDERS: &[&str] = &["-", "–", "—", "--", "s/d", "n/a"];

/// Read a cell as an amount.
pub fn cell_amount(cell: &CellValue) -> Amount {
    match cell {
        CellValue::Empty => Amount::Empty,
        CellValue::Number(value) if value.is_finite() => Amount::Value(*value),
        CellValue::Number(_) => Amount::Malformed,
        CellValue::Text(text) => parse_amount(text),
    }
}

/// Parse amount text.
///
/// Handles:
/// - thousands separators in either convention: `1,234.5`, `1.234,5`
/// - a lone separator before three digits as grouping: `2.000`, `1,500`
/// - parentheses as negatives: `(1,500)` is `-1500`
/// - currency and percent signs, regular and non-breaking spaces
/// - dash placeholders (`-`, `–`, `—`), which are empty
pub fn parse_amount(raw: &str) -> Amount {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        return Amount::Empty;
    }
    if PLACEHOLDERS
        .iter()
        .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
    {
        return Amount::Empty;
    }

    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\u{a0}' | '\u{202f}' | '$' | '%'))
        .collect();
    let Some((normalized, grouped)) = normalize_separators(&cleaned) else {
        return Amount::Malformed;
    };
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let value = if negative { -value.abs() } else { value };
            if grouped {
                Amount::Grouped(value)
            } else {
                Amount::Value(value)
            }
        }
        _ => Amount::Malformed,
    }
}

/// Rewrite separators so the text parses with `str::parse::<f64>`.
///
/// With both `.` and `,` present the rightmost one is the decimal separator.
/// A separator kind repeated more than once is a thousands separator. A
/// lone separator is grouping when [`is_lone_grouping`] says so, which the
/// returned flag reports, and a decimal separator otherwise.
fn normalize_separators(text: &str) -> Option<(String, bool)> {
    if text.is_empty() {
        return None;
    }
    let dots = text.matches('.').count();
    let commas = text.matches(',').count();
    let mut grouped = false;
    let normalized = match (dots, commas) {
        (0, 0) => text.to_string(),
        (1, 0) | (0, 1) => {
            let separator = if dots == 1 { '.' } else { ',' };
            let (integer, fraction) = text.split_once(separator)?;
            grouped = is_lone_grouping(integer, fraction);
            if grouped {
                text.replace(separator, "")
            } else {
                text.replace(separator, ".")
            }
        }
        (_, 0) => text.replace('.', ""),
        (0, _) => text.replace(',', ""),
        _ => {
            let last_dot = text.rfind('.')?;
            let last_comma = text.rfind(',')?;
            if last_comma > last_dot {
                text.replace('.', "").replace(',', ".")
            } else {
                text.replace(',', "")
            }
        }
    };
    let valid = normalized
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'));
    valid.then_some((normalized, grouped))
}

/// Exactly three digits after the separator and a non-zero integer part.
fn is_lone_grouping(integer: &str, fraction: &str) -> bool {
    let digits = integer.trim_start_matches(['-', '+']);
    fraction.len() == 3
        && fraction.chars().all(|ch| ch.is_ascii_digit())
        && !digits.is_empty()
        && digits.chars().all(|ch| ch.is_ascii_digit())
        && digits.chars().any(|ch| ch != '0')
}
