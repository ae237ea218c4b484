pub mod error;
pub mod pipeline;
pub mod snapshot;
pub mod stages;
pub mod summary;
pub mod table;

pub use error::{PipelineError, Result};
pub use pipeline::{run, PipelineOutcome, StageSelection};
pub use snapshot::{persist, serialize_table};
pub use summary::{
    summarize, CategoricalStats, ColumnStats, ColumnSummary, NumericStats, TableSummary,
};
pub use table::{load, read_table, restore};
