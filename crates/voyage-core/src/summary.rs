use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub total_missing: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub missing: usize,
    pub stats: ColumnStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalStats {
    pub count: usize,
    pub distinct: usize,
    pub top: Option<String>,
    pub top_frequency: usize,
}

/// Computes per-column descriptive statistics plus missing-value counts.
/// Numeric columns get mean, sample standard deviation, min/max, and linearly
/// interpolated quartiles; string columns get distinct and most-frequent
/// counts. The table itself is never mutated.
pub fn summarize(df: &DataFrame) -> Result<TableSummary> {
    let mut columns = Vec::with_capacity(df.width());
    let mut total_missing = 0;

    for column in df.get_columns() {
        let name = column.name().to_string();
        let missing = column.null_count();
        total_missing += missing;

        let stats = match column.dtype() {
            DataType::Int64 | DataType::Float64 => ColumnStats::Numeric(numeric_stats(column)?),
            DataType::String => ColumnStats::Categorical(categorical_stats(column.str()?)),
            other => {
                return Err(PipelineError::UnsupportedColumn {
                    column: name,
                    dtype: other.to_string(),
                })
            }
        };

        columns.push(ColumnSummary {
            name,
            missing,
            stats,
        });
    }

    Ok(TableSummary {
        rows: df.height(),
        total_missing,
        columns,
    })
}

fn numeric_stats(column: &Column) -> Result<NumericStats> {
    let values = match column.dtype() {
        DataType::Float64 => column.f64()?.clone(),
        _ => column.cast(&DataType::Float64)?.f64()?.clone(),
    };

    let mut sorted: Vec<f64> = Vec::with_capacity(values.len());
    for idx in 0..values.len() {
        if let Some(value) = values.get(idx) {
            sorted.push(value);
        }
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = if count > 0 {
        Some(sorted.iter().sum::<f64>() / count as f64)
    } else {
        None
    };
    let std_dev = match mean {
        Some(mean) if count > 1 => {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            Some(variance.sqrt())
        }
        _ => None,
    };

    Ok(NumericStats {
        count,
        mean,
        std_dev,
        min: sorted.first().copied(),
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    })
}

fn categorical_stats(values: &StringChunked) -> CategoricalStats {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut count = 0;

    for idx in 0..values.len() {
        if let Some(value) = values.get(idx) {
            let order = counts.len();
            let entry = counts.entry(value).or_insert((0, order));
            entry.0 += 1;
            count += 1;
        }
    }

    // highest frequency wins; ties go to the value seen first
    let mut top: Option<(&str, usize, usize)> = None;
    for (&value, &(frequency, order)) in &counts {
        let better = match top {
            None => true,
            Some((_, best_frequency, best_order)) => {
                frequency > best_frequency || (frequency == best_frequency && order < best_order)
            }
        };
        if better {
            top = Some((value, frequency, order));
        }
    }

    CategoricalStats {
        count,
        distinct: counts.len(),
        top: top.map(|(value, _, _)| value.to_string()),
        top_frequency: top.map(|(_, frequency, _)| frequency).unwrap_or(0),
    }
}

fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = position - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}
