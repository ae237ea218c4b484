use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use polars::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Parses delimited text with a header row into a DataFrame.
///
/// Column dtypes are inferred from the cell contents: a column where every
/// non-empty cell parses as an integer becomes Int64, one where every
/// non-empty cell parses as a float becomes Float64, anything else is kept as
/// String. Empty cells (after trimming) are null.
pub fn read_table(content: &str) -> Result<DataFrame> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|header| header.is_empty()) {
        return Err(PipelineError::Parse {
            line: 1,
            message: "missing header row".to_string(),
        });
    }

    for (idx, header) in headers.iter().enumerate() {
        if headers[..idx].contains(header) {
            return Err(PipelineError::Parse {
                line: 1,
                message: format!("duplicate column name '{header}'"),
            });
        }
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = idx + 2;

        if record.len() != headers.len() {
            return Err(PipelineError::Parse {
                line,
                message: format!(
                    "expected {} columns, found {}",
                    headers.len(),
                    record.len()
                ),
            });
        }

        for (col, raw) in record.iter().enumerate() {
            let trimmed = raw.trim();
            cells[col].push(if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            });
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .zip(&cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();

    let df = DataFrame::new(columns)?;
    debug!(rows = df.height(), columns = df.width(), "table parsed");
    Ok(df)
}

/// Loads a delimited file from disk, failing with `NotFound` when the path
/// does not exist.
pub fn load(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    read_table(&content)
}

/// Reads a snapshot file if one exists at `path`. A missing snapshot is not
/// an error; the caller keeps whatever table it already has.
pub fn restore(path: &Path) -> Result<Option<DataFrame>> {
    if !path.exists() {
        return Ok(None);
    }
    load(path).map(Some)
}

fn infer_column(name: &str, values: &[Option<String>]) -> Column {
    let non_null: Vec<&str> = values.iter().flatten().map(String::as_str).collect();

    if !non_null.is_empty() && non_null.iter().all(|v| v.parse::<i64>().is_ok()) {
        let parsed: Vec<Option<i64>> = values
            .iter()
            .map(|v| v.as_deref().and_then(|s| s.parse().ok()))
            .collect();
        return Series::new(name.into(), parsed).into();
    }

    if !non_null.is_empty() && non_null.iter().all(|v| v.parse::<f64>().is_ok()) {
        let parsed: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.as_deref().and_then(|s| s.parse().ok()))
            .collect();
        return Series::new(name.into(), parsed).into();
    }

    let parsed: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
    Series::new(name.into(), parsed).into()
}

/// Textual form of one cell, `None` for a null. Float64 values always carry a
/// decimal point so an all-whole float column does not reload as Int64.
pub fn cell_text(column: &Column, idx: usize) -> Result<Option<String>> {
    match column.dtype() {
        DataType::Int64 => Ok(column.i64()?.get(idx).map(|v| v.to_string())),
        DataType::Float64 => Ok(column.f64()?.get(idx).map(format_float)),
        DataType::String => Ok(column.str()?.get(idx).map(str::to_string)),
        other => Err(PipelineError::UnsupportedColumn {
            column: column.name().to_string(),
            dtype: other.to_string(),
        }),
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
