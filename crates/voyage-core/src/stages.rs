use std::collections::{BTreeMap, HashSet};

use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::table::cell_text;

/// Deterministic, column-specific imputation: `Age` nulls become 0, `Fare`
/// nulls become 1, `Cabin` nulls become `"NA"`. Every other column is left
/// untouched. Re-running on an already-filled table is a no-op.
pub fn fill_missing(df: &DataFrame) -> Result<DataFrame> {
    const STAGE: &str = "fill-missing";

    let mut out = df.clone();
    fill_numeric(&mut out, STAGE, "Age", 0)?;
    fill_numeric(&mut out, STAGE, "Fare", 1)?;
    fill_string(&mut out, STAGE, "Cabin", "NA")?;
    Ok(out)
}

/// Removes rows that exactly duplicate an earlier row across every column,
/// keeping the first occurrence. Nulls compare equal to nulls.
pub fn drop_duplicates(df: &DataFrame) -> Result<DataFrame> {
    let columns = df.get_columns();
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(df.height());
    let mut keep = Vec::with_capacity(df.height());

    for idx in 0..df.height() {
        let mut key = Vec::with_capacity(columns.len());
        for column in columns {
            key.push(cell_text(column, idx)?);
        }
        keep.push(seen.insert(key));
    }

    let dropped = keep.iter().filter(|kept| !**kept).count();
    if dropped > 0 {
        info!(dropped, "removing duplicate rows");
    }

    let mask = BooleanChunked::new("keep".into(), keep);
    Ok(df.filter(&mask)?)
}

/// Adds `AgeGroup` from `Age` using half-open intervals; the lower bound
/// belongs to the higher bin. A null `Age` bins to the sentinel category
/// `"Unknown"` rather than falling through a float comparison.
pub fn bin_age(df: &DataFrame) -> Result<DataFrame> {
    const STAGE: &str = "bin-age";

    let ages = float_values(column_for_stage(df, STAGE, "Age")?, STAGE, "Age")?;

    let mut groups: Vec<&str> = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        groups.push(match ages.get(idx) {
            None => "Unknown",
            Some(age) if age < 18.0 => "<18",
            Some(age) if age < 40.0 => "18-40",
            Some(age) if age < 60.0 => "40-60",
            Some(_) => "60+",
        });
    }

    let mut out = df.clone();
    out.with_column(Series::new("AgeGroup".into(), groups))?;
    Ok(out)
}

/// Adds `FamilySize` = `SibSp + Parch` per row. A null in either input is an
/// error; family size is never computed against an implicit zero.
pub fn compute_family_size(df: &DataFrame) -> Result<DataFrame> {
    const STAGE: &str = "family-size";

    let sibsp = integer_values(column_for_stage(df, STAGE, "SibSp")?, STAGE, "SibSp")?;
    let parch = integer_values(column_for_stage(df, STAGE, "Parch")?, STAGE, "Parch")?;

    let mut sizes: Vec<i64> = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        match (sibsp.get(idx), parch.get(idx)) {
            (Some(siblings), Some(parents)) => sizes.push(siblings + parents),
            (None, _) => {
                return Err(PipelineError::MissingValue {
                    stage: STAGE,
                    row: idx,
                    column: "SibSp",
                })
            }
            (_, None) => {
                return Err(PipelineError::MissingValue {
                    stage: STAGE,
                    row: idx,
                    column: "Parch",
                })
            }
        }
    }

    let mut out = df.clone();
    out.with_column(Series::new("FamilySize".into(), sizes))?;
    Ok(out)
}

/// Adds `Embarked_mapped` from `Embarked` via a fixed port lookup. Codes
/// outside the lookup pass through unchanged, nulls stay null, and the
/// original `Embarked` column is preserved.
pub fn map_embarked(df: &DataFrame) -> Result<DataFrame> {
    const STAGE: &str = "map-embarked";

    let column = column_for_stage(df, STAGE, "Embarked")?;
    let codes = match column.dtype() {
        DataType::String => column.str()?.clone(),
        other => {
            return Err(PipelineError::ColumnType {
                stage: STAGE,
                column: "Embarked".to_string(),
                expected: "string",
                found: other.to_string(),
            })
        }
    };

    let mut mapped: Vec<Option<&str>> = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        mapped.push(codes.get(idx).map(|code| match code {
            "S" => "Southampton",
            "C" => "Cherbourg",
            "Q" => "Queenstown",
            other => other,
        }));
    }

    report_survivors_by_port(df, &mapped);

    let mut out = df.clone();
    out.with_column(Series::new("Embarked_mapped".into(), mapped))?;
    Ok(out)
}

// diagnostic only; skipped when no integer Survived column is present
fn report_survivors_by_port(df: &DataFrame, ports: &[Option<&str>]) {
    let Ok(survived) = df.column("Survived") else {
        return;
    };
    let Ok(survived) = survived.i64() else {
        return;
    };

    let mut tally: BTreeMap<&str, i64> = BTreeMap::new();
    for (idx, port) in ports.iter().enumerate() {
        if let (Some(port), Some(flag)) = (*port, survived.get(idx)) {
            *tally.entry(port).or_insert(0) += flag;
        }
    }

    for (port, survivors) in tally {
        info!(port, survivors, "survivors by embarkation port");
    }
}

fn column_for_stage<'a>(
    df: &'a DataFrame,
    stage: &'static str,
    name: &str,
) -> Result<&'a Column> {
    df.column(name).map_err(|_| PipelineError::MissingColumn {
        stage,
        column: name.to_string(),
    })
}

fn fill_numeric(df: &mut DataFrame, stage: &'static str, name: &str, fill: i64) -> Result<()> {
    let column = column_for_stage(df, stage, name)?;

    let filled = match column.dtype() {
        DataType::Int64 => {
            let values = column.i64()?;
            if values.null_count() == 0 {
                return Ok(());
            }
            let mut out: Vec<i64> = Vec::with_capacity(values.len());
            for idx in 0..values.len() {
                out.push(values.get(idx).unwrap_or(fill));
            }
            Series::new(name.into(), out)
        }
        DataType::Float64 => {
            let values = column.f64()?;
            if values.null_count() == 0 {
                return Ok(());
            }
            let mut out: Vec<f64> = Vec::with_capacity(values.len());
            for idx in 0..values.len() {
                out.push(values.get(idx).unwrap_or(fill as f64));
            }
            Series::new(name.into(), out)
        }
        // a column with no non-null cells loads as String; fill it as numeric
        DataType::String if column.null_count() == column.len() => {
            Series::new(name.into(), vec![fill; column.len()])
        }
        other => {
            return Err(PipelineError::ColumnType {
                stage,
                column: name.to_string(),
                expected: "numeric",
                found: other.to_string(),
            })
        }
    };

    df.with_column(filled)?;
    Ok(())
}

fn fill_string(
    df: &mut DataFrame,
    stage: &'static str,
    name: &str,
    fill: &'static str,
) -> Result<()> {
    let column = column_for_stage(df, stage, name)?;

    let values = match column.dtype() {
        DataType::String => column.str()?,
        other => {
            return Err(PipelineError::ColumnType {
                stage,
                column: name.to_string(),
                expected: "string",
                found: other.to_string(),
            })
        }
    };

    if values.null_count() == 0 {
        return Ok(());
    }

    let mut out: Vec<&str> = Vec::with_capacity(values.len());
    for idx in 0..values.len() {
        out.push(values.get(idx).unwrap_or(fill));
    }

    let filled = Series::new(name.into(), out);
    df.with_column(filled)?;
    Ok(())
}

fn float_values(column: &Column, stage: &'static str, name: &str) -> Result<Float64Chunked> {
    match column.dtype() {
        DataType::Float64 => Ok(column.f64()?.clone()),
        DataType::Int64 => Ok(column.cast(&DataType::Float64)?.f64()?.clone()),
        DataType::String if column.null_count() == column.len() => {
            Ok(Float64Chunked::full_null(name.into(), column.len()))
        }
        other => Err(PipelineError::ColumnType {
            stage,
            column: name.to_string(),
            expected: "numeric",
            found: other.to_string(),
        }),
    }
}

fn integer_values(column: &Column, stage: &'static str, name: &str) -> Result<Int64Chunked> {
    match column.dtype() {
        DataType::Int64 => Ok(column.i64()?.clone()),
        DataType::String if column.null_count() == column.len() => {
            Ok(Int64Chunked::full_null(name.into(), column.len()))
        }
        other => Err(PipelineError::ColumnType {
            stage,
            column: name.to_string(),
            expected: "integer",
            found: other.to_string(),
        }),
    }
}
