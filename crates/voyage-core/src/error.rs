use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{stage} requires column '{column}'")]
    MissingColumn {
        stage: &'static str,
        column: String,
    },

    #[error("{stage} expected {expected} values in column '{column}', found {found}")]
    ColumnType {
        stage: &'static str,
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("{stage}: row {row} has no value for '{column}'")]
    MissingValue {
        stage: &'static str,
        row: usize,
        column: &'static str,
    },

    #[error("unsupported column type {dtype} in '{column}'")]
    UnsupportedColumn { column: String, dtype: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
