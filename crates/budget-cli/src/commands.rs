use std::path::Path;

use anyhow::{Context, Result};
use budget_model::{LedgerConfig, SourceType, schema_for};
use budget_parse::WorksheetOptions;
use chrono::Utc;
use comfy_table::Table;
use tracing::{info, info_span};

use budget_cli::pipeline::{FileOutcome, RunOptions, process_files};
use budget_cli::render::{write_markdown, write_records_json, write_report_json};

use crate::cli::{InputArgs, ParseArgs, ValidateArgs};
use crate::summary::apply_table_style;

/// Built-in defaults, or the TOML file given with `--config`.
pub fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    match path {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("load configuration {}", path.display())),
        None => Ok(LedgerConfig::default()),
    }
}

pub fn run_sources() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Source", "Description", "Levels", "Fields"]);
    apply_table_style(&mut table);
    for source in SourceType::all() {
        let schema = schema_for(source);
        let fields: Vec<&str> = schema.fields.iter().map(|field| field.name).collect();
        table.add_row(vec![
            source.code().to_string(),
            source.description().to_string(),
            source.depth().levels().to_string(),
            fields.join(", "),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_parse(args: &ParseArgs, config: &LedgerConfig) -> Result<Vec<FileOutcome>> {
    run_input(&args.input, config, false)
}

pub fn run_validate(args: &ValidateArgs, config: &LedgerConfig) -> Result<Vec<FileOutcome>> {
    let outcomes = run_input(&args.input, config, true)?;
    for outcome in &outcomes {
        if let Some(dir) = &args.report_json
            && let Some(path) = write_report_json(dir, outcome)?
        {
            info!(path = %path.display(), "report written");
        }
        if let Some(dir) = &args.markdown
            && let Some(path) = write_markdown(dir, outcome)?
        {
            info!(path = %path.display(), "markdown written");
        }
    }
    Ok(outcomes)
}

fn run_input(input: &InputArgs, config: &LedgerConfig, validate: bool) -> Result<Vec<FileOutcome>> {
    let span = info_span!("run", source = %input.source, files = input.files.len());
    let _guard = span.enter();
    let options = RunOptions {
        source: input.source,
        year: input.year,
        worksheet: WorksheetOptions::default().with_delimiter(input.delimiter),
        validate,
        generated_at: Utc::now(),
    };
    let outcomes = process_files(&input.files, &options, config);
    if let Some(dir) = &input.records_json {
        for outcome in &outcomes {
            if let Some(path) = write_records_json(dir, outcome)? {
                info!(path = %path.display(), "records written");
            }
        }
    }
    Ok(outcomes)
}
