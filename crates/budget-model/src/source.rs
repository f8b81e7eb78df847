//! Source table families and reporting periods.
//!
//! A [`SourceType`] identifies which kind of ledger a worksheet holds. It
//! decides the hierarchy depth, the field set read from the worksheet and
//! which validation checks apply.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cumulative reporting period of an execution report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// First quarter (3 months).
    Q1,
    /// First half (6 months).
    H1,
    /// First three quarters (9 months).
    Q3,
    /// Full year (12 months).
    Annual,
}

impl ReportPeriod {
    /// All periods in calendar order.
    pub const ALL: [ReportPeriod; 4] = [Self::Q1, Self::H1, Self::Q3, Self::Annual];

    /// Months covered by the period.
    pub fn months(self) -> u8 {
        match self {
            Self::Q1 => 3,
            Self::H1 => 6,
            Self::Q3 => 9,
            Self::Annual => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "q1",
            Self::H1 => "h1",
            Self::Q3 => "q3",
            Self::Annual => "annual",
        }
    }
}

/// Table family, used to key configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFamily {
    /// Annual budget law.
    Law,
    /// Quarterly execution report.
    Execution,
    /// Medium-term (multi-year) plan.
    Plan,
}

impl SourceFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Law => "law",
            Self::Execution => "execution",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for SourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of hierarchy levels below the grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyDepth {
    /// Org unit → program.
    Two,
    /// Org unit → program → subprogram.
    Three,
}

impl HierarchyDepth {
    pub fn levels(self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// Closed set of supported source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceType {
    /// Annual budget law (initial credits).
    AnnualLaw,
    /// Execution report for a cumulative period.
    ExecutionReport(ReportPeriod),
    /// Medium-term plan with one amount per projected year.
    MediumTermPlan,
}

impl SourceType {
    /// Every source type, in display order.
    pub fn all() -> Vec<SourceType> {
        let mut all = vec![SourceType::AnnualLaw];
        all.extend(ReportPeriod::ALL.into_iter().map(SourceType::ExecutionReport));
        all.push(SourceType::MediumTermPlan);
        all
    }

    pub fn family(self) -> SourceFamily {
        match self {
            Self::AnnualLaw => SourceFamily::Law,
            Self::ExecutionReport(_) => SourceFamily::Execution,
            Self::MediumTermPlan => SourceFamily::Plan,
        }
    }

    pub fn depth(self) -> HierarchyDepth {
        match self {
            Self::AnnualLaw | Self::ExecutionReport(_) => HierarchyDepth::Three,
            Self::MediumTermPlan => HierarchyDepth::Two,
        }
    }

    pub fn is_execution(self) -> bool {
        matches!(self, Self::ExecutionReport(_))
    }

    /// Stable identifier used on the command line and in reports.
    pub fn code(self) -> &'static str {
        match self {
            Self::AnnualLaw => "law",
            Self::ExecutionReport(ReportPeriod::Q1) => "execution-q1",
            Self::ExecutionReport(ReportPeriod::H1) => "execution-h1",
            Self::ExecutionReport(ReportPeriod::Q3) => "execution-q3",
            Self::ExecutionReport(ReportPeriod::Annual) => "execution-annual",
            Self::MediumTermPlan => "plan",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AnnualLaw => "Annual budget law",
            Self::ExecutionReport(ReportPeriod::Q1) => "Execution report, first quarter",
            Self::ExecutionReport(ReportPeriod::H1) => "Execution report, first half",
            Self::ExecutionReport(ReportPeriod::Q3) => "Execution report, third quarter",
            Self::ExecutionReport(ReportPeriod::Annual) => "Execution report, full year",
            Self::MediumTermPlan => "Medium-term plan",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SourceType {
    type Err = String;

    /// Accepts the codes produced by [`SourceType::code`], case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        SourceType::all()
            .into_iter()
            .find(|source| source.code() == normalized)
            .ok_or_else(|| format!("Unknown source type: {s}"))
    }
}

impl TryFrom<String> for SourceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceType> for String {
    fn from(value: SourceType) -> Self {
        value.code().to_string()
    }
}
