//! # Batch scoring over series sets
//!
//! Run a full anomaly scoring pass over a [`SeriesSet`] and report attribute coverage.
//!
//! ## Overview
//! -----------------
//! This module implements the [`SeriesScoring`] trait on `SeriesSet`, providing:
//!
//! * `score_all` – score **every object** and build the ranked table,
//! * `score_all_with_cancel` – same, with **cooperative cancellation**,
//! * `total_observations` / `number_of_objects` – quick set-level metrics,
//! * `coverage` – per-attribute count of the objects that can actually be scored.
//!
//! Objects are visited in ascending [`ObjectNumber`] order so that repeated runs over the
//! same set build identical tables.
//!
//! ## Execution Modes
//! -----------------
//! ### Progress UI (feature: `progress`)
//! With the `progress` feature, both scoring methods render a live progress bar (via
//! `indicatif`) with the last and smoothed per-object durations.
//!
//! ### Cooperative cancellation
//! `score_all_with_cancel` calls `should_cancel()` before the first object and then on
//! **wall-clock intervals** (20 ms), not on iteration counts. A cancelled run still returns a report over the objects
//! processed so far, flagged `interrupted`.
//!
//! ## Examples
//! -----------------
//! ```rust,no_run
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use snaps::scoring::ScoringParams;
//! use snaps::series::series_scoring::SeriesScoring;
//!
//! # fn demo(set: snaps::SeriesSet) -> Result<(), snaps::SnapsError> {
//! let stop = AtomicBool::new(false);
//! let params = ScoringParams::default();
//! eprintln!("{:#}", set.coverage(&params));
//! let report = set.score_all_with_cancel(&params, || stop.load(Ordering::Relaxed))?;
//! eprintln!("{report}");
//! # Ok(()) }
//! ```
use std::fmt;
use std::time::{Duration, Instant};

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use itertools::Itertools;

use crate::constants::{ObjectNumber, SeriesSet};
use crate::engine::{AnomalyRun, RunReport};
use crate::observations::Attribute;
use crate::scoring::ScoringParams;
use crate::snaps_errors::SnapsError;

#[cfg(feature = "progress")]
use super::progress_bar::{fmt_dur, new_bar, IterTimer};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How well one attribute is covered across a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCoverage {
    pub attribute: Attribute,
    /// Observations carrying a value.
    pub observations: usize,
    /// Objects with enough values to be scored on this attribute.
    pub scorable_objects: usize,
    /// Objects with at least one value but too few to be scored.
    pub sparse_objects: usize,
}

/// Per-attribute coverage of a set for a given configuration.
///
/// Objects counted in [`AttributeCoverage::sparse_objects`] or carrying no value at all
/// get a neutralised cell for that attribute.
///
/// Display
/// -----------------
/// * `{}` – `elong 2/3, rb 3/3` (scorable objects per attribute).
/// * `{:#}` – a table with every count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCoverage {
    pub objects: usize,
    pub observations: usize,
    /// One entry per configured attribute, in configuration order.
    pub attributes: Vec<AttributeCoverage>,
}

impl SetCoverage {
    pub fn get(&self, attribute: &Attribute) -> Option<&AttributeCoverage> {
        self.attributes.iter().find(|c| &c.attribute == attribute)
    }
}

impl fmt::Display for SetCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            let parts = self
                .attributes
                .iter()
                .map(|c| format!("{} {}/{}", c.attribute, c.scorable_objects, self.objects))
                .join(", ");
            return f.write_str(&parts);
        }

        writeln!(
            f,
            "Coverage over {} objects, {} observations",
            self.objects, self.observations
        )?;
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Attribute", "Observations", "Scorable", "Sparse", "Unobserved"]);
        for c in &self.attributes {
            table.add_row(vec![
                Cell::new(&c.attribute),
                Cell::new(c.observations),
                Cell::new(c.scorable_objects),
                Cell::new(c.sparse_objects),
                Cell::new(self.objects - c.scorable_objects - c.sparse_objects),
            ]);
        }
        write!(f, "{table}")
    }
}

pub trait SeriesScoring {
    /// Score every object of the set.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: run configuration.
    ///
    /// Return
    /// ----------
    /// * A [`RunReport`]; per-object problems are recorded inside it.
    ///
    /// See also
    /// ------------
    /// * [`crate::engine::score_object`] – Per-object scoring.
    fn score_all(&self, params: &ScoringParams) -> Result<RunReport, SnapsError>;

    /// Same as [`score_all`](SeriesScoring::score_all), polling `should_cancel` every
    /// 20 ms of wall-clock time.
    fn score_all_with_cancel<F>(
        &self,
        params: &ScoringParams,
        should_cancel: F,
    ) -> Result<RunReport, SnapsError>
    where
        F: FnMut() -> bool;

    /// Object identifiers in ascending order.
    fn sorted_objects(&self) -> Vec<&ObjectNumber>;

    /// Total number of observations across all objects.
    fn total_observations(&self) -> usize;

    /// Number of distinct objects.
    fn number_of_objects(&self) -> usize;

    /// How many objects each attribute of `params` can be scored on.
    fn coverage(&self, params: &ScoringParams) -> SetCoverage;
}

impl SeriesScoring for SeriesSet {
    fn score_all(&self, params: &ScoringParams) -> Result<RunReport, SnapsError> {
        self.score_all_with_cancel(params, || false)
    }

    #[cfg(feature = "progress")]
    fn score_all_with_cancel<F>(
        &self,
        params: &ScoringParams,
        mut should_cancel: F,
    ) -> Result<RunReport, SnapsError>
    where
        F: FnMut() -> bool,
    {
        let ids = self.sorted_objects();
        let pb = new_bar(ids.len());
        let mut it_timer = IterTimer::new(0.2);
        let mut run = AnomalyRun::new(params.clone());
        let mut last_poll: Option<Instant> = None;

        for object in ids {
            if last_poll.map_or(true, |t| t.elapsed() >= POLL_INTERVAL) {
                if should_cancel() {
                    pb.set_message("Interrupted");
                    run.mark_interrupted();
                    break;
                }
                last_poll = Some(Instant::now());
            }

            let last = it_timer.tick();
            pb.set_message(format!(
                "last: {}, avg: {}",
                fmt_dur(last),
                fmt_dur(it_timer.avg())
            ));

            run.process(object, &self[object]);
            pb.inc(1);
        }

        pb.disable_steady_tick();
        pb.finish_and_clear();
        run.finish()
    }

    #[cfg(not(feature = "progress"))]
    fn score_all_with_cancel<F>(
        &self,
        params: &ScoringParams,
        mut should_cancel: F,
    ) -> Result<RunReport, SnapsError>
    where
        F: FnMut() -> bool,
    {
        let mut run = AnomalyRun::new(params.clone());
        let mut last_poll: Option<Instant> = None;

        for object in self.sorted_objects() {
            if last_poll.map_or(true, |t| t.elapsed() >= POLL_INTERVAL) {
                if should_cancel() {
                    run.mark_interrupted();
                    break;
                }
                last_poll = Some(Instant::now());
            }
            run.process(object, &self[object]);
        }

        run.finish()
    }

    fn sorted_objects(&self) -> Vec<&ObjectNumber> {
        self.keys().sorted().collect()
    }

    #[inline]
    fn total_observations(&self) -> usize {
        self.values().map(|s| s.len()).sum()
    }

    #[inline]
    fn number_of_objects(&self) -> usize {
        self.len()
    }

    fn coverage(&self, params: &ScoringParams) -> SetCoverage {
        let required = params.extreme_mode.min_values();
        let attributes = params
            .attributes
            .iter()
            .map(|attr| {
                let mut cov = AttributeCoverage {
                    attribute: attr.clone(),
                    observations: 0,
                    scorable_objects: 0,
                    sparse_objects: 0,
                };
                for series in self.values() {
                    let n = series.iter().filter(|o| o.value(attr).is_some()).count();
                    cov.observations += n;
                    if n >= required {
                        cov.scorable_objects += 1;
                    } else if n > 0 {
                        cov.sparse_objects += 1;
                    }
                }
                cov
            })
            .collect();

        SetCoverage {
            objects: self.number_of_objects(),
            observations: self.total_observations(),
            attributes,
        }
    }
}
