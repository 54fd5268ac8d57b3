//! # Range filters over a ranked table
//!
//! A [`RangeFilterSession`] narrows a finished [`RankedTable`] with successive
//! [`RangeFilter`]s (column + bounds), keeping a history so filters can be undone.
//!
//! ## Entry points
//! -----------------
//! * [`RangeFilterSession::apply_interactive`] – **exclusive** bounds, `low < v < high`.
//!   An empty result puts the session in [`RunState::AwaitingRecovery`]; exactly one
//!   [`RecoveryAction`] must then be passed to [`RangeFilterSession::recover`].
//! * [`RangeFilterSession::apply_batch`] – **inclusive** bounds, `low <= v <= high`.
//!   An empty result is rolled back automatically and reported as
//!   [`SnapsError::EmptyFilterResult`].
//!
//! Rows without a value in the filtered column (e.g. no rating) never match.
//!
//! ## States
//! -----------------
//! ```text
//! Ranked ──apply (non-empty)──▶ Ranked
//! Ranked ──apply_interactive (empty)──▶ AwaitingRecovery
//! AwaitingRecovery ──ResetLast / ResetAll──▶ Ranked
//! AwaitingRecovery ──Continue──▶ Done (empty table)
//! Ranked ──finish──▶ Done
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::RunState;
use crate::snaps_errors::SnapsError;
use crate::table::{Column, RankedTable};

/// Bounds on one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub column: Column,
    pub low: f64,
    pub high: f64,
}

impl RangeFilter {
    /// Create a filter; infinite bounds are allowed, NaN and `low > high` are not.
    pub fn new(column: Column, low: f64, high: f64) -> Result<Self, SnapsError> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(SnapsError::InvalidParameter(format!(
                "invalid range ({low}, {high}) for column '{column}'"
            )));
        }
        Ok(RangeFilter { column, low, high })
    }

    pub fn matches_exclusive(&self, v: f64) -> bool {
        v > self.low && v < self.high
    }

    pub fn matches_inclusive(&self, v: f64) -> bool {
        v >= self.low && v <= self.high
    }

    fn empty_error(&self) -> SnapsError {
        SnapsError::EmptyFilterResult {
            column: self.column.to_string(),
            low: self.low,
            high: self.high,
        }
    }
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in ({}, {})", self.column, self.low, self.high)
    }
}

/// Choice offered after an interactive filter emptied the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    /// Accept the empty result and end the session.
    Continue,
    /// Drop the filter that emptied the table.
    ResetLast,
    /// Drop every filter and return to the unfiltered table.
    ResetAll,
}

/// Result of an interactive filter application.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStep {
    Applied { remaining: usize },
    Empty { rejected: RangeFilter },
}

#[derive(Debug, Clone)]
pub struct RangeFilterSession {
    original: RankedTable,
    history: Vec<(RangeFilter, RankedTable)>,
    pending: Option<RangeFilter>,
    state: RunState,
}

impl RangeFilterSession {
    pub fn new(table: RankedTable) -> Self {
        RangeFilterSession {
            original: table,
            history: Vec::new(),
            pending: None,
            state: RunState::Ranked,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn original(&self) -> &RankedTable {
        &self.original
    }

    /// Table after every committed filter.
    pub fn current(&self) -> &RankedTable {
        self.history
            .last()
            .map(|(_, t)| t)
            .unwrap_or(&self.original)
    }

    /// Committed filters, oldest first.
    pub fn applied_filters(&self) -> Vec<&RangeFilter> {
        self.history.iter().map(|(f, _)| f).collect()
    }

    /// Filter waiting for a recovery action, if any.
    pub fn pending(&self) -> Option<&RangeFilter> {
        self.pending.as_ref()
    }

    fn ensure_ranked(&self, op: &str) -> Result<(), SnapsError> {
        match self.state {
            RunState::Ranked => Ok(()),
            other => Err(SnapsError::InvalidState(format!(
                "cannot {op} while the session is {other}"
            ))),
        }
    }

    fn narrow(&self, filter: &RangeFilter, inclusive: bool) -> RankedTable {
        self.current().filtered(|row| match row.value(&filter.column) {
            Some(v) if inclusive => filter.matches_inclusive(v),
            Some(v) => filter.matches_exclusive(v),
            None => false,
        })
    }

    /// Apply `filter` with exclusive bounds.
    ///
    /// Return
    /// ----------
    /// * `Ok(FilterStep::Applied)` – the filter is committed.
    /// * `Ok(FilterStep::Empty)` – nothing matched; call [`Self::recover`] next.
    /// * `Err(SnapsError::InvalidState)` – the session is awaiting recovery or done.
    pub fn apply_interactive(&mut self, filter: RangeFilter) -> Result<FilterStep, SnapsError> {
        self.ensure_ranked("apply a filter")?;
        let next = self.narrow(&filter, false);
        if next.is_empty() {
            warn!(filter = %filter, "range filter left no rows, awaiting recovery");
            self.pending = Some(filter.clone());
            self.state = RunState::AwaitingRecovery;
            return Ok(FilterStep::Empty { rejected: filter });
        }
        let remaining = next.len();
        debug!(filter = %filter, remaining, "range filter applied");
        self.history.push((filter, next));
        Ok(FilterStep::Applied { remaining })
    }

    /// Resolve an empty interactive result.
    pub fn recover(&mut self, action: RecoveryAction) -> Result<&RankedTable, SnapsError> {
        if self.state != RunState::AwaitingRecovery {
            return Err(SnapsError::InvalidState(format!(
                "recovery requested while the session is {}",
                self.state
            )));
        }
        let rejected = self.pending.take();
        match action {
            RecoveryAction::Continue => {
                if let Some(filter) = rejected {
                    let empty = self.current().filtered(|_| false);
                    self.history.push((filter, empty));
                }
                self.state = RunState::Done;
            }
            RecoveryAction::ResetLast => self.state = RunState::Ranked,
            RecoveryAction::ResetAll => {
                self.history.clear();
                self.state = RunState::Ranked;
            }
        }
        debug!(?action, rows = self.current().len(), "range filter recovery");
        Ok(self.current())
    }

    /// Apply `filter` with inclusive bounds, rolling back automatically on an empty result.
    ///
    /// Return
    /// ----------
    /// * `Ok(n)` – rows remaining after the committed filter.
    /// * `Err(SnapsError::EmptyFilterResult)` – nothing matched; the table is unchanged.
    pub fn apply_batch(&mut self, filter: RangeFilter) -> Result<usize, SnapsError> {
        self.ensure_ranked("apply a filter")?;
        let next = self.narrow(&filter, true);
        if next.is_empty() {
            warn!(filter = %filter, "range filter left no rows, rolled back");
            return Err(filter.empty_error());
        }
        let remaining = next.len();
        self.history.push((filter, next));
        Ok(remaining)
    }

    /// Remove the most recent committed filter.
    pub fn undo(&mut self) -> Result<Option<RangeFilter>, SnapsError> {
        self.ensure_ranked("undo")?;
        Ok(self.history.pop().map(|(f, _)| f))
    }

    /// Remove every committed filter.
    pub fn reset(&mut self) -> Result<(), SnapsError> {
        self.ensure_ranked("reset")?;
        self.history.clear();
        Ok(())
    }

    /// End the session with the current table.
    pub fn finish(&mut self) -> Result<&RankedTable, SnapsError> {
        self.ensure_ranked("finish")?;
        self.state = RunState::Done;
        Ok(self.current())
    }

    pub fn into_table(self) -> RankedTable {
        match self.history.into_iter().last() {
            Some((_, t)) => t,
            None => self.original,
        }
    }
}
