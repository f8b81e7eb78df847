//! Label normalization and fragment matching.
//!
//! Labels are compared word by word after normalization. A pattern matches
//! when its words occur as a contiguous run inside the row text. With a
//! non-zero tolerance, each run of the pattern's length is also scored with
//! Jaro-Winkler similarity and accepted at `similarity >= 1 - tolerance`.

use budget_model::{LabelKind, LabelPatterns};
use rapidfuzz::distance::jaro_winkler;
use serde::Serialize;

/// Index of the matching pattern within its candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatternId(pub usize);

/// Normalize label text for matching.
///
/// Lowercases, folds Spanish diacritics, turns punctuation (including
/// ordinal indicators and degree signs) into spaces and collapses
/// whitespace.
pub fn normalize_label(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let folded = fold_diacritic(ch);
        if folded.is_alphanumeric() && !matches!(folded, 'º' | 'ª') {
            spaced.push(folded);
        } else {
            spaced.push(' ');
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Match raw text against an ordered pattern list.
///
/// Returns the first pattern, in list order, that matches. Unmatched text
/// yields `None`.
pub fn classify_label(
    text: &str,
    candidate_patterns: &[String],
    tolerance: f64,
) -> Option<PatternId> {
    LabelSet::new(candidate_patterns).find(&normalize_label(text), tolerance)
}

/// Pre-normalized pattern list.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    patterns: Vec<Vec<String>>,
}

impl LabelSet {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|pattern| {
                    normalize_label(pattern)
                        .split(' ')
                        .filter(|word| !word.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .collect(),
        }
    }

    /// Normalized words of a pattern.
    pub fn words(&self, id: PatternId) -> &[String] {
        self.patterns
            .get(id.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Find the first matching pattern in already-normalized text.
    pub fn find(&self, normalized: &str, tolerance: f64) -> Option<PatternId> {
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
        if words.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .position(|pattern| matches_run(&words, pattern, tolerance))
            .map(PatternId)
    }
}

fn matches_run(words: &[&str], pattern: &[String], tolerance: f64) -> bool {
    let width = pattern.len();
    if width == 0 || width > words.len() {
        return false;
    }
    let exact = words.windows(width).any(|window| {
        window
            .iter()
            .zip(pattern)
            .all(|(word, expected)| *word == expected.as_str())
    });
    if exact || tolerance <= 0.0 {
        return exact;
    }
    let target = pattern.join(" ");
    let threshold = 1.0 - tolerance;
    words.windows(width).any(|window| {
        let candidate = window.join(" ");
        jaro_winkler::similarity(candidate.chars(), target.chars()) >= threshold
    })
}

/// Matchers for every label kind of one source type and year.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    grand_total: LabelSet,
    org_unit: LabelSet,
    program: LabelSet,
    tolerance: f64,
}

impl LabelMatcher {
    pub fn new(labels: &LabelPatterns, tolerance: f64) -> Self {
        Self {
            grand_total: LabelSet::new(&labels.grand_total),
            org_unit: LabelSet::new(&labels.org_unit),
            program: LabelSet::new(&labels.program),
            tolerance,
        }
    }

    pub fn set(&self, kind: LabelKind) -> &LabelSet {
        match kind {
            LabelKind::GrandTotal => &self.grand_total,
            LabelKind::OrgUnit => &self.org_unit,
            LabelKind::Program => &self.program,
        }
    }

    /// Match already-normalized text against one label kind.
    pub fn find(&self, kind: LabelKind, normalized: &str) -> Option<PatternId> {
        self.set(kind).find(normalized, self.tolerance)
    }
}
