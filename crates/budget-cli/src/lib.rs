//! Library side of the `budget-ledger` command: logging setup, the per-file
//! pipeline and report rendering.

pub mod logging;
pub mod pipeline;
pub mod render;

pub use pipeline::{
    FileOutcome, FileStatus, ParsedFile, RunOptions, exit_code_for, infer_year, process_file,
    process_files,
};
