use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::table::cell_text;

/// Serializes a table to delimited text with a header row, preserving the
/// table's current column order. Nulls are written as the empty string;
/// Float64 cells always carry a decimal point so the dtype survives a reload.
pub fn serialize_table(df: &DataFrame) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(df.get_column_names_str())?;

    let columns = df.get_columns();
    for idx in 0..df.height() {
        let mut record = Vec::with_capacity(columns.len());
        for column in columns {
            record.push(cell_text(column, idx)?.unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|err| PipelineError::Io(err.into_error()))
}

/// Writes the snapshot file, overwriting any existing one. The table is
/// serialized fully in memory first so a failure never leaves a partial
/// snapshot behind.
pub fn persist(df: &DataFrame, path: &Path) -> Result<()> {
    let bytes = serialize_table(df)?;
    fs::write(path, bytes)?;
    info!(path = %path.display(), rows = df.height(), "snapshot written");
    Ok(())
}
