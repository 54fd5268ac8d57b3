pub mod constants;
pub mod engine;
pub mod filter;
pub mod observations;
pub mod scoring;
pub mod series;
pub mod snaps_errors;
pub mod table;

pub use constants::{ObjectNumber, ObjectSeries, SeriesSet};
pub use engine::{inspect_object, run_batch, AnomalyRun, RunReport, RunState, SeriesLoader};
pub use filter::{FilterPolicy, RangeFilter, RangeFilterSession, RecoveryAction};
pub use observations::{Attribute, Observation};
pub use scoring::ScoringParams;
pub use series::series_file::SeriesFile;
pub use series::series_scoring::SeriesScoring;
pub use snaps_errors::SnapsError;
pub use table::{Column, RankedTable};
