use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use polars::prelude::DataFrame;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voyage_core::table::cell_text;
use voyage_core::{ColumnStats, StageSelection, TableSummary};

/// A CLI for the passenger-manifest cleaning pipeline
#[derive(Parser, Debug)]
#[command(author, version, about = "Passenger manifest cleaning pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a manifest, apply the selected cleaning stages, and persist a snapshot
    Clean(CleanArgs),
}

#[derive(Args, Debug, Default)]
struct CleanArgs {
    /// Path to the delimited input file
    path: PathBuf,

    /// Print descriptive statistics for the table before any transformation
    #[arg(long)]
    show_info: bool,

    /// Fill missing Age, Fare, and Cabin values
    #[arg(long)]
    fill_missing: bool,

    /// Remove rows that duplicate an earlier row exactly
    #[arg(long)]
    drop_duplicates: bool,

    /// Derive the AgeGroup column from Age
    #[arg(long)]
    bin_age: bool,

    /// Derive the FamilySize column from SibSp and Parch
    #[arg(long)]
    family_size: bool,

    /// Derive the Embarked_mapped column from Embarked
    #[arg(long)]
    map_embarked: bool,

    /// Print the first rows of the final table
    #[arg(long)]
    show_head: bool,

    /// Number of rows printed by --show-head
    #[arg(long, default_value_t = 5)]
    head_rows: usize,

    /// Snapshot file restored before the run and rewritten after it
    #[arg(long, default_value = "temp_titanic_data.csv")]
    snapshot: PathBuf,

    /// Skip writing the snapshot after the run
    #[arg(long)]
    no_persist: bool,

    /// Emit the --show-info report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Clean(args) => handle_clean(args),
    }
}

fn handle_clean(args: CleanArgs) -> Result<()> {
    if !args.path.exists() {
        bail!("input file not found: {}", args.path.display());
    }

    let loaded = voyage_core::load(&args.path)
        .with_context(|| format!("failed to load {}", args.path.display()))?;

    let table = match voyage_core::restore(&args.snapshot)
        .with_context(|| format!("failed to restore snapshot {}", args.snapshot.display()))?
    {
        Some(snapshot) => {
            info!(path = %args.snapshot.display(), "restored snapshot from previous run");
            snapshot
        }
        None => loaded,
    };

    let selection = StageSelection {
        show_info: args.show_info,
        fill_missing: args.fill_missing,
        drop_duplicates: args.drop_duplicates,
        bin_age: args.bin_age,
        family_size: args.family_size,
        map_embarked: args.map_embarked,
    };
    let outcome = voyage_core::run(table, &selection)?;

    if let Some(summary) = &outcome.summary {
        if args.json {
            println!("{}", serde_json::to_string_pretty(summary)?);
        } else {
            print_summary(summary);
        }
    }

    if !args.no_persist {
        voyage_core::persist(&outcome.table, &args.snapshot)
            .with_context(|| format!("failed to persist {}", args.snapshot.display()))?;
    }

    if args.show_head {
        print_head(&outcome.table, args.head_rows)?;
    }

    Ok(())
}

fn print_summary(summary: &TableSummary) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "column", "missing", "count", "mean", "std", "min", "q1", "median", "q3", "max",
        "distinct", "top",
    ]);

    for column in &summary.columns {
        let row = match &column.stats {
            ColumnStats::Numeric(stats) => vec![
                column.name.clone(),
                column.missing.to_string(),
                stats.count.to_string(),
                fmt_stat(stats.mean),
                fmt_stat(stats.std_dev),
                fmt_stat(stats.min),
                fmt_stat(stats.q1),
                fmt_stat(stats.median),
                fmt_stat(stats.q3),
                fmt_stat(stats.max),
                "-".to_string(),
                "-".to_string(),
            ],
            ColumnStats::Categorical(stats) => vec![
                column.name.clone(),
                column.missing.to_string(),
                stats.count.to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                stats.distinct.to_string(),
                stats
                    .top
                    .as_ref()
                    .map(|top| format!("{top} ({}x)", stats.top_frequency))
                    .unwrap_or_else(|| "-".to_string()),
            ],
        };
        table.add_row(row);
    }

    println!("{table}");
    println!(
        "{} rows, {} missing values in total",
        summary.rows, summary.total_missing
    );
}

fn print_head(df: &DataFrame, rows: usize) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(df.get_column_names_str());

    let columns = df.get_columns();
    for idx in 0..rows.min(df.height()) {
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            row.push(cell_text(column, idx)?.unwrap_or_else(|| "null".to_string()));
        }
        table.add_row(row);
    }

    println!("{table}");
    Ok(())
}

fn fmt_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string())
}
