//! CLI argument definitions for the budget ledger tool.

use std::path::PathBuf;

use budget_model::SourceType;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "budget-ledger",
    version,
    about = "Rebuild and validate hierarchical budget ledger worksheets",
    long_about = "Rebuild the org unit / program / subprogram hierarchy of budget ledger \
                  worksheets exported to CSV, then check printed totals, signs, periods \
                  and percentages.\n\n\
                  Exit codes: 0 no errors, 1 no data to validate, 2 validation errors."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file overriding labels, tolerances, layouts and severities.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow worksheet row text in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rebuild the hierarchy and print parse diagnostics.
    Parse(ParseArgs),

    /// Rebuild the hierarchy and run the consistency checks.
    Validate(ValidateArgs),

    /// List supported source types and their fields.
    Sources,
}

/// Worksheet inputs shared by `parse` and `validate`.
#[derive(Args)]
pub struct InputArgs {
    /// CSV worksheet exports.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Source type of every file (see `sources`).
    #[arg(long, short = 's', value_parser = parse_source)]
    pub source: SourceType,

    /// Fiscal year; inferred from each file name when omitted.
    #[arg(long, short = 'y')]
    pub year: Option<u16>,

    /// CSV field delimiter.
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Directory for `<name>.records.json` files.
    #[arg(long = "records-json", value_name = "DIR")]
    pub records_json: Option<PathBuf>,
}

#[derive(Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory for `<name>.report.json` files.
    #[arg(long = "report-json", value_name = "DIR")]
    pub report_json: Option<PathBuf>,

    /// Directory for `<name>.report.md` files.
    #[arg(long, value_name = "DIR")]
    pub markdown: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_source(value: &str) -> Result<SourceType, String> {
    value.parse()
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("delimiter must be a single ASCII character, got {value:?}")),
        },
    }
}
