use polars::prelude::DataFrame;
use tracing::info;

use crate::error::Result;
use crate::stages;
use crate::summary::{summarize, TableSummary};

/// Independent selectors for the pipeline stages. Selection order does not
/// matter; enabled stages always run in the fixed pipeline order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageSelection {
    pub show_info: bool,
    pub fill_missing: bool,
    pub drop_duplicates: bool,
    pub bin_age: bool,
    pub family_size: bool,
    pub map_embarked: bool,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub table: DataFrame,
    pub summary: Option<TableSummary>,
}

type Stage = fn(&DataFrame) -> Result<DataFrame>;

/// Runs the selected stages over the table. The summary, when requested, is
/// computed first against the table as loaded or restored; the
/// transformations then run in a fixed order because the later ones (age
/// binning, family size) only have well-defined output on filled values.
pub fn run(df: DataFrame, selection: &StageSelection) -> Result<PipelineOutcome> {
    let summary = if selection.show_info {
        Some(summarize(&df)?)
    } else {
        None
    };

    let plan: [(bool, &str, Stage); 5] = [
        (selection.fill_missing, "fill-missing", stages::fill_missing),
        (
            selection.drop_duplicates,
            "drop-duplicates",
            stages::drop_duplicates,
        ),
        (selection.bin_age, "bin-age", stages::bin_age),
        (
            selection.family_size,
            "family-size",
            stages::compute_family_size,
        ),
        (selection.map_embarked, "map-embarked", stages::map_embarked),
    ];

    let mut table = df;
    for (enabled, name, stage) in plan {
        if !enabled {
            continue;
        }
        table = stage(&table)?;
        info!(stage = name, rows = table.height(), "stage applied");
    }

    Ok(PipelineOutcome { table, summary })
}
