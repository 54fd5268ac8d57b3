//! # Result tables
//!
//! * [`row`] – [`SigmaCell`] / [`SigmaRow`], the immutable per-object result.
//! * [`column`] – numeric [`Column`] selectors.
//! * [`builder`] – [`TableBuilder`], the one construction path.
//! * [`ranked_table`] – [`RankedTable`], summaries, sorting and rendering.
pub mod builder;
pub mod column;
pub mod ranked_table;
pub mod row;

pub use builder::TableBuilder;
pub use column::Column;
pub use ranked_table::{ColumnSummary, RankedTable, TableCell};
pub use row::{SigmaCell, SigmaRow, Trigger};
