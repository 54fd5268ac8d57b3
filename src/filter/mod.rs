//! # Filtering
//!
//! Two stages filter the results of a run:
//!
//! 1. [`policy`] – per-object retention while the table is being built;
//! 2. [`range`] – range filters over a finished table, with undo and reset.
pub mod policy;
pub mod range;

pub use policy::{apply_policy, FilterDecision, FilterPolicy};
pub use range::{FilterStep, RangeFilter, RangeFilterSession, RecoveryAction};
