//! Ledger configuration: label patterns, tolerances, layouts and severity
//! overrides.
//!
//! Built-in defaults are complete. A TOML file only overrides what it names:
//!
//! ```toml
//! label_tolerance = 0.1
//!
//! [law.tolerances]
//! total_absolute = 1.0
//!
//! [[law.year_overrides]]
//! year = 2012
//! org_unit = ["jurisdiccion"]
//!
//! [[severity]]
//! check = "negative_totals"
//! level = "org_unit"
//! severity = "error"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conformance::{CheckId, HierarchyLevel, Severity};
use crate::error::{ConfigError, Result};
use crate::layout::ColumnLayout;
use crate::source::{SourceFamily, SourceType};

/// Which label a pattern list recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    GrandTotal,
    OrgUnit,
    Program,
}

impl LabelKind {
    pub const ALL: [LabelKind; 3] = [Self::GrandTotal, Self::OrgUnit, Self::Program];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GrandTotal => "grand_total",
            Self::OrgUnit => "org_unit",
            Self::Program => "program",
        }
    }
}

/// Ordered label patterns per label kind. The first matching pattern wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPatterns {
    pub grand_total: Vec<String>,
    pub org_unit: Vec<String>,
    pub program: Vec<String>,
}

impl LabelPatterns {
    pub fn get(&self, kind: LabelKind) -> &[String] {
        match kind {
            LabelKind::GrandTotal => &self.grand_total,
            LabelKind::OrgUnit => &self.org_unit,
            LabelKind::Program => &self.program,
        }
    }

    fn get_mut(&mut self, kind: LabelKind) -> &mut Vec<String> {
        match kind {
            LabelKind::GrandTotal => &mut self.grand_total,
            LabelKind::OrgUnit => &mut self.org_unit,
            LabelKind::Program => &mut self.program,
        }
    }

    fn defaults(family: SourceFamily) -> Self {
        let grand_total = match family {
            SourceFamily::Plan => owned(&["total general", "total plan", "total presupuesto"]),
            SourceFamily::Law | SourceFamily::Execution => {
                owned(&["total general", "total presupuesto"])
            }
        };
        Self {
            grand_total,
            org_unit: owned(&["entidad", "unidad responsable", "organismo"]),
            program: owned(&["programa"]),
        }
    }
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| (*p).to_string()).collect()
}

/// Numeric tolerances used by the validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Absolute tolerance for hierarchical sums, in currency units.
    pub total_absolute: f64,
    /// Relative tolerance for recomputed percentages, as a fraction
    /// (`0.0025` is 0.25%).
    pub percentage_relative: f64,
}

impl Tolerances {
    fn defaults(family: SourceFamily) -> Self {
        let total_absolute = match family {
            SourceFamily::Law | SourceFamily::Plan => 0.5,
            SourceFamily::Execution => 2.0,
        };
        Self {
            total_absolute,
            percentage_relative: 0.0025,
        }
    }
}

/// Replacement pattern lists for one fiscal year.
///
/// A list present here replaces the family default for that label kind; it
/// is never merged with it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YearOverride {
    pub year: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<Vec<String>>,
}

impl YearOverride {
    pub fn get(&self, kind: LabelKind) -> Option<&Vec<String>> {
        match kind {
            LabelKind::GrandTotal => self.grand_total.as_ref(),
            LabelKind::OrgUnit => self.org_unit.as_ref(),
            LabelKind::Program => self.program.as_ref(),
        }
    }
}

/// Settings for one source family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub labels: LabelPatterns,
    pub tolerances: Tolerances,
    /// Column layout replacing the built-in one for every type in the family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<ColumnLayout>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub year_overrides: Vec<YearOverride>,
}

impl FamilyConfig {
    pub fn defaults(family: SourceFamily) -> Self {
        Self {
            labels: LabelPatterns::defaults(family),
            tolerances: Tolerances::defaults(family),
            layout: None,
            year_overrides: Vec::new(),
        }
    }
}

/// Severity override for one check, optionally restricted to one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityOverride {
    pub check: CheckId,
    /// Level the override applies to; all levels when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<HierarchyLevel>,
    pub severity: Severity,
}

/// Complete configuration, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Fuzzy label tolerance; 0 requires exact fragment matches.
    pub label_tolerance: f64,
    pub law: FamilyConfig,
    pub execution: FamilyConfig,
    pub plan: FamilyConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub severity: Vec<SeverityOverride>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            label_tolerance: 0.0,
            law: FamilyConfig::defaults(SourceFamily::Law),
            execution: FamilyConfig::defaults(SourceFamily::Execution),
            plan: FamilyConfig::defaults(SourceFamily::Plan),
            severity: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Load a TOML config file on top of the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse TOML text on top of the built-in defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Toml {
            origin: origin.to_string(),
            source,
        })?;
        let mut config = Self::default();
        file.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn family(&self, family: SourceFamily) -> &FamilyConfig {
        match family {
            SourceFamily::Law => &self.law,
            SourceFamily::Execution => &self.execution,
            SourceFamily::Plan => &self.plan,
        }
    }

    fn family_mut(&mut self, family: SourceFamily) -> &mut FamilyConfig {
        match family {
            SourceFamily::Law => &mut self.law,
            SourceFamily::Execution => &mut self.execution,
            SourceFamily::Plan => &mut self.plan,
        }
    }

    /// Label patterns in effect for a source type and fiscal year.
    pub fn labels_for(&self, source: SourceType, year: Option<u16>) -> LabelPatterns {
        let family = self.family(source.family());
        let mut labels = family.labels.clone();
        let Some(year) = year else {
            return labels;
        };
        if let Some(overrides) = family.year_overrides.iter().rev().find(|o| o.year == year) {
            for kind in LabelKind::ALL {
                if let Some(patterns) = overrides.get(kind) {
                    *labels.get_mut(kind) = patterns.clone();
                }
            }
        }
        labels
    }

    pub fn layout_for(&self, source: SourceType) -> ColumnLayout {
        self.family(source.family())
            .layout
            .clone()
            .unwrap_or_else(|| ColumnLayout::default_for(source))
    }

    pub fn tolerances_for(&self, source: SourceType) -> Tolerances {
        self.family(source.family()).tolerances
    }

    /// Effective severity of a failure. A level-specific override beats a
    /// check-wide one; later entries beat earlier ones.
    pub fn severity_for(&self, check: CheckId, level: HierarchyLevel, default: Severity) -> Severity {
        let matching = || self.severity.iter().rev().filter(move |o| o.check == check);
        matching()
            .find(|o| o.level == Some(level))
            .or_else(|| matching().find(|o| o.level.is_none()))
            .map_or(default, |o| o.severity)
    }

    pub fn with_label_tolerance(mut self, tolerance: f64) -> Self {
        self.label_tolerance = tolerance;
        self
    }

    pub fn with_severity_override(mut self, severity: SeverityOverride) -> Self {
        self.severity.push(severity);
        self
    }

    pub fn with_tolerances(mut self, family: SourceFamily, tolerances: Tolerances) -> Self {
        self.family_mut(family).tolerances = tolerances;
        self
    }

    pub fn with_layout(mut self, family: SourceFamily, layout: ColumnLayout) -> Self {
        self.family_mut(family).layout = Some(layout);
        self
    }

    /// Reject values that would make matching or checks meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.label_tolerance) {
            return Err(ConfigError::invalid(format!(
                "label_tolerance must be in [0, 1), got {}",
                self.label_tolerance
            )));
        }
        for family in [SourceFamily::Law, SourceFamily::Execution, SourceFamily::Plan] {
            let config = self.family(family);
            let Tolerances {
                total_absolute,
                percentage_relative,
            } = config.tolerances;
            for (name, value) in [
                ("total_absolute", total_absolute),
                ("percentage_relative", percentage_relative),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::invalid(format!(
                        "{family}.tolerances.{name} must be a non-negative number, got {value}"
                    )));
                }
            }
            for kind in LabelKind::ALL {
                if config.labels.get(kind).iter().all(|p| p.trim().is_empty()) {
                    return Err(ConfigError::invalid(format!(
                        "{family}.labels.{} must contain at least one pattern",
                        kind.as_str()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// On-disk shape: every key optional, applied over the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    label_tolerance: Option<f64>,
    law: FamilySection,
    execution: FamilySection,
    plan: FamilySection,
    severity: Vec<SeverityOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FamilySection {
    labels: LabelSection,
    tolerances: ToleranceSection,
    layout: Option<ColumnLayout>,
    year_overrides: Vec<YearOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LabelSection {
    grand_total: Option<Vec<String>>,
    org_unit: Option<Vec<String>>,
    program: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ToleranceSection {
    total_absolute: Option<f64>,
    percentage_relative: Option<f64>,
}

impl ConfigFile {
    fn apply_to(self, config: &mut LedgerConfig) {
        if let Some(tolerance) = self.label_tolerance {
            config.label_tolerance = tolerance;
        }
        let sections = [
            (SourceFamily::Law, self.law),
            (SourceFamily::Execution, self.execution),
            (SourceFamily::Plan, self.plan),
        ];
        for (family, section) in sections {
            section.apply_to(config.family_mut(family));
        }
        config.severity.extend(self.severity);
    }
}

impl FamilySection {
    fn apply_to(self, family: &mut FamilyConfig) {
        let LabelSection {
            grand_total,
            org_unit,
            program,
        } = self.labels;
        for (kind, patterns) in [
            (LabelKind::GrandTotal, grand_total),
            (LabelKind::OrgUnit, org_unit),
            (LabelKind::Program, program),
        ] {
            if let Some(patterns) = patterns {
                *family.labels.get_mut(kind) = patterns;
            }
        }
        if let Some(value) = self.tolerances.total_absolute {
            family.tolerances.total_absolute = value;
        }
        if let Some(value) = self.tolerances.percentage_relative {
            family.tolerances.percentage_relative = value;
        }
        if self.layout.is_some() {
            family.layout = self.layout;
        }
        family.year_overrides.extend(self.year_overrides);
    }
}
