//! # Run engine
//!
//! Drives a scoring run over many objects and builds the [`RankedTable`].
//!
//! ## Overview
//! -----------------
//! For each object, in order:
//!
//! 1. Load its series through a [`SeriesLoader`] (a failure skips the object),
//! 2. Score every attribute of interest with [`SigmaScorer`],
//! 3. Aggregate the signed sigmas into [`RowSums`],
//! 4. Rate the series with [`AnomalyRater`] when the policy needs a rating,
//! 5. Apply the [`FilterPolicy`](crate::filter::FilterPolicy) and append surviving rows.
//!
//! The only mutable state of a run is a [`RunAccumulator`], passed into and returned
//! from [`score_object`]. [`AnomalyRun`] owns one and hands the finished table over in a
//! [`RunReport`], from which a [`RangeFilterSession`] can be opened.
//!
//! ## Error Semantics
//! -----------------
//! * `InsufficientData` / `DegenerateRange` on one attribute neutralise that cell (sigma
//!   `0`, no trigger) and are reported as [`AttributeWarning`]s. An attribute counts only
//!   the observations that carry it, so sparse columns end up here.
//! * Any other error is fatal for that object's row only and lands in
//!   [`RunReport::failures`].
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use snaps::engine::run_batch;
//! use snaps::scoring::ScoringParams;
//! use snaps::{ObjectNumber, SeriesSet};
//!
//! # fn demo(set: SeriesSet) -> Result<(), snaps::SnapsError> {
//! let params = ScoringParams::default();
//! let ids: Vec<ObjectNumber> = vec![ObjectNumber::Int(1465), ObjectNumber::Int(8467)];
//! let report = run_batch(&set, &ids, &params)?;
//! println!("{report:#}");
//! # Ok(()) }
//! ```
use std::collections::HashSet;
use std::fmt;

use ahash::RandomState;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::{debug, info, warn};

use crate::constants::{ObjectNumber, ObjectSeries, Rating, SeriesSet};
use crate::filter::{apply_policy, RangeFilterSession};
use crate::observations::{Attribute, Observation};
use crate::scoring::aggregate::RowSums;
use crate::scoring::rating::{AnomalyRater, RatingOutcome};
use crate::scoring::sigma::{AttributeSigma, SigmaScorer};
use crate::scoring::ScoringParams;
use crate::snaps_errors::SnapsError;
use crate::table::{RankedTable, SigmaCell, SigmaRow, TableBuilder};

/// State of the range-filter session opened on a finished run.
///
/// The building phase before it is the [`AnomalyRun`] itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The table is final; range filters may be applied.
    Ranked,
    /// A range filter emptied the table; a recovery action is required.
    AwaitingRecovery,
    /// Filtering is over.
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Ranked => "ranked",
            RunState::AwaitingRecovery => "awaiting recovery",
            RunState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Source of object series for a run.
pub trait SeriesLoader {
    /// Return the series of `object`.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::LoadFailure)` – the object cannot be served. Other error kinds
    ///   are reported as load failures by the run.
    fn load_series(&self, object: &ObjectNumber) -> Result<ObjectSeries, SnapsError>;
}

impl SeriesLoader for SeriesSet {
    fn load_series(&self, object: &ObjectNumber) -> Result<ObjectSeries, SnapsError> {
        self.get(object)
            .cloned()
            .ok_or_else(|| SnapsError::LoadFailure {
                object: object.clone(),
                reason: "object not present in the series set".into(),
            })
    }
}

/// A neutralised attribute of one object.
#[derive(Debug, PartialEq)]
pub struct AttributeWarning {
    pub object: ObjectNumber,
    pub attribute: Attribute,
    pub error: SnapsError,
}

impl fmt::Display for AttributeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.object, self.attribute, self.error)
    }
}

/// An object whose row could not be produced.
#[derive(Debug, PartialEq)]
pub struct ObjectFailure {
    pub object: ObjectNumber,
    pub error: SnapsError,
}

impl fmt::Display for ObjectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.object, self.error)
    }
}

/// A row stripped by the filter policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressedRow {
    pub object: ObjectNumber,
    pub zeroed: usize,
    pub rating: Option<Rating>,
}

/// Append-only state of one run: surviving rows and the source ids of their triggers.
///
/// Passed by value into [`score_object`] and returned with the new row appended, so that
/// nothing leaks from one run to the next. Call [`clear`](Self::clear) to reuse it.
#[derive(Debug, Clone, Default)]
pub struct RunAccumulator {
    rows: Vec<SigmaRow>,
    trigger_ids: Vec<String>,
    seen: HashSet<ObjectNumber, RandomState>,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row and record its triggering source ids.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::InvalidParameter)` if the object already has a row.
    pub fn push(&mut self, row: SigmaRow) -> Result<(), SnapsError> {
        if !self.seen.insert(row.object().clone()) {
            return Err(SnapsError::InvalidParameter(format!(
                "object {} was already scored in this run",
                row.object()
            )));
        }
        self.trigger_ids
            .extend(row.cells().iter().filter_map(|c| c.source_id().map(str::to_owned)));
        self.rows.push(row);
        Ok(())
    }

    pub fn contains(&self, object: &ObjectNumber) -> bool {
        self.seen.contains(object)
    }

    pub fn rows(&self) -> &[SigmaRow] {
        &self.rows
    }

    pub fn trigger_ids(&self) -> &[String] {
        &self.trigger_ids
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.trigger_ids.clear();
        self.seen.clear();
    }

    pub fn into_rows(self) -> Vec<SigmaRow> {
        self.rows
    }
}

/// What happened to one object.
#[derive(Debug, PartialEq)]
pub enum ObjectOutcome {
    Kept,
    Suppressed { zeroed: usize, rating: Option<Rating> },
    Failed(SnapsError),
}

/// Outcome of [`score_object`] together with the attribute warnings it raised.
#[derive(Debug, PartialEq)]
pub struct ObjectVerdict {
    pub outcome: ObjectOutcome,
    pub warnings: Vec<AttributeWarning>,
}

/// Condensed [`ObjectOutcome`] returned by [`AnomalyRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStatus {
    Kept,
    Suppressed,
    Failed,
}

/// How [`evaluate`] treats the rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RatingMode {
    /// Not computed.
    Skip,
    /// Computed; only neutralisable errors are turned into warnings.
    Required,
    /// Computed when possible; any error becomes a warning.
    BestEffort,
}

/// Per-attribute and rating results of one series, before any policy.
struct Evaluation {
    sigmas: Vec<(Attribute, Option<AttributeSigma>)>,
    sums: RowSums,
    rating: Option<RatingOutcome>,
    warnings: Vec<AttributeWarning>,
}

impl Evaluation {
    fn cells(&self) -> Vec<SigmaCell> {
        self.sigmas
            .iter()
            .map(|(attr, s)| match s {
                Some(s) => SigmaCell::from(s),
                None => SigmaCell::neutral(attr.clone()),
            })
            .collect()
    }
}

fn evaluate(
    object: &ObjectNumber,
    series: &[Observation],
    params: &ScoringParams,
    rating_mode: RatingMode,
) -> Result<Evaluation, SnapsError> {
    let scorer = SigmaScorer::from_params(params);
    let mut warnings = Vec::new();
    let mut sigmas = Vec::with_capacity(params.attributes.len());

    for attr in &params.attributes {
        match scorer.score(series, attr, params.weight(attr)) {
            Ok(s) => sigmas.push((attr.clone(), Some(s))),
            Err(e) if e.is_neutralisable() => {
                warn!(object = %object, attribute = %attr, error = %e, "attribute neutralised");
                warnings.push(AttributeWarning {
                    object: object.clone(),
                    attribute: attr.clone(),
                    error: e,
                });
                sigmas.push((attr.clone(), None));
            }
            Err(e) => return Err(e),
        }
    }

    let sums = RowSums::from_sigmas(
        sigmas
            .iter()
            .map(|(_, s)| s.as_ref().map_or(0.0, |s| s.signed_sigma)),
    );

    let rating = if rating_mode == RatingMode::Skip {
        None
    } else {
        match AnomalyRater::from_params(params).rate(series) {
            Ok(outcome) => {
                for attr in &outcome.degenerate {
                    warn!(object = %object, attribute = %attr, "rated attribute has no spread");
                    warnings.push(AttributeWarning {
                        object: object.clone(),
                        attribute: attr.clone(),
                        error: SnapsError::DegenerateRange {
                            attribute: attr.to_string(),
                        },
                    });
                }
                for attr in &outcome.unobserved {
                    warn!(object = %object, attribute = %attr, "rated attribute never observed");
                    warnings.push(AttributeWarning {
                        object: object.clone(),
                        attribute: attr.clone(),
                        error: SnapsError::InsufficientData {
                            attribute: attr.to_string(),
                            count: 0,
                        },
                    });
                }
                Some(outcome)
            }
            Err(e) if e.is_neutralisable() || rating_mode == RatingMode::BestEffort => {
                warn!(object = %object, error = %e, "rating not computable");
                let attribute = params
                    .rated_attributes
                    .first()
                    .map(|r| r.attribute.clone())
                    .unwrap_or(Attribute::Elong);
                warnings.push(AttributeWarning {
                    object: object.clone(),
                    attribute,
                    error: e,
                });
                None
            }
            Err(e) => return Err(e),
        }
    };

    Ok(Evaluation {
        sigmas,
        sums,
        rating,
        warnings,
    })
}

/// Score one object and append its row to `acc` if the policy keeps it.
///
/// Arguments
/// -----------------
/// * `acc` – accumulator of the current run, returned updated.
/// * `object` – identifier of the object.
/// * `series` – its observations.
/// * `params` – run configuration.
///
/// Return
/// ----------
/// * The accumulator and an [`ObjectVerdict`]. Row sums are taken over the scored sigmas
///   before any zeroing by the occurrence-count policy.
///
/// See also
/// ------------
/// * [`apply_policy`] – Retention decision.
/// * [`AnomalyRun`] – Owns the accumulator for a whole run.
pub fn score_object(
    mut acc: RunAccumulator,
    object: &ObjectNumber,
    series: &[Observation],
    params: &ScoringParams,
) -> (RunAccumulator, ObjectVerdict) {
    let rating_mode = if params.filter.computes_rating() {
        RatingMode::Required
    } else {
        RatingMode::Skip
    };
    let eval = match evaluate(object, series, params, rating_mode) {
        Ok(eval) => eval,
        Err(e) => {
            warn!(object = %object, error = %e, "object row rejected");
            return (
                acc,
                ObjectVerdict {
                    outcome: ObjectOutcome::Failed(e),
                    warnings: Vec::new(),
                },
            );
        }
    };

    let rating = eval.rating.as_ref().map(|r| r.rating);
    let decision = apply_policy(&params.filter, &eval.cells(), rating);

    let outcome = if decision.keep {
        let row = SigmaRow::new(object.clone(), decision.cells, eval.sums, rating);
        match acc.push(row) {
            Ok(()) => ObjectOutcome::Kept,
            Err(e) => ObjectOutcome::Failed(e),
        }
    } else {
        ObjectOutcome::Suppressed {
            zeroed: decision.zeroed,
            rating,
        }
    };
    debug!(object = %object, n_obs = series.len(), ?outcome, "object scored");

    (
        acc,
        ObjectVerdict {
            outcome,
            warnings: eval.warnings,
        },
    )
}

/// A run whose table is still being built.
///
/// [`finish`](Self::finish) consumes it; the [`RunReport`] it returns holds the final table.
#[derive(Debug)]
pub struct AnomalyRun {
    params: ScoringParams,
    acc: RunAccumulator,
    failures: Vec<ObjectFailure>,
    warnings: Vec<AttributeWarning>,
    suppressed: Vec<SuppressedRow>,
    processed: usize,
    interrupted: bool,
}

impl AnomalyRun {
    pub fn new(params: ScoringParams) -> Self {
        AnomalyRun {
            params,
            acc: RunAccumulator::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            suppressed: Vec::new(),
            processed: 0,
            interrupted: false,
        }
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Score one object from an already loaded series.
    pub fn process(&mut self, object: &ObjectNumber, series: &[Observation]) -> ObjectStatus {
        self.processed += 1;
        let acc = std::mem::take(&mut self.acc);
        let (acc, verdict) = score_object(acc, object, series, &self.params);
        self.acc = acc;
        self.warnings.extend(verdict.warnings);

        match verdict.outcome {
            ObjectOutcome::Kept => ObjectStatus::Kept,
            ObjectOutcome::Suppressed { zeroed, rating } => {
                self.suppressed.push(SuppressedRow {
                    object: object.clone(),
                    zeroed,
                    rating,
                });
                ObjectStatus::Suppressed
            }
            ObjectOutcome::Failed(error) => {
                self.failures.push(ObjectFailure {
                    object: object.clone(),
                    error,
                });
                ObjectStatus::Failed
            }
        }
    }

    /// Load `object` from `loader` and score it. A load error skips the object.
    pub fn process_loaded<L>(&mut self, loader: &L, object: &ObjectNumber) -> ObjectStatus
    where
        L: SeriesLoader + ?Sized,
    {
        match loader.load_series(object) {
            Ok(series) => self.process(object, &series),
            Err(e) => {
                self.processed += 1;
                let error = match e {
                    e @ SnapsError::LoadFailure { .. } => e,
                    other => SnapsError::LoadFailure {
                        object: object.clone(),
                        reason: other.to_string(),
                    },
                };
                warn!(object = %object, error = %error, "object skipped");
                self.failures.push(ObjectFailure {
                    object: object.clone(),
                    error,
                });
                ObjectStatus::Failed
            }
        }
    }

    /// Flag the run as stopped before every object was processed.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Build the final table.
    pub fn finish(self) -> Result<RunReport, SnapsError> {
        let table = TableBuilder::new(self.params.attributes.clone()).build(self.acc.into_rows())?;
        info!(
            processed = self.processed,
            kept = table.len(),
            suppressed = self.suppressed.len(),
            failed = self.failures.len(),
            warnings = self.warnings.len(),
            interrupted = self.interrupted,
            "run finished"
        );
        Ok(RunReport {
            table,
            failures: self.failures,
            warnings: self.warnings,
            suppressed: self.suppressed,
            processed: self.processed,
            interrupted: self.interrupted,
        })
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub table: RankedTable,
    pub failures: Vec<ObjectFailure>,
    pub warnings: Vec<AttributeWarning>,
    pub suppressed: Vec<SuppressedRow>,
    pub processed: usize,
    pub interrupted: bool,
}

impl RunReport {
    /// Open a range-filter session on the table, in [`RunState::Ranked`].
    pub fn into_session(self) -> RangeFilterSession {
        RangeFilterSession::new(self.table)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run report")?;
        writeln!(f, "----------")?;
        writeln!(f, "processed   : {}", self.processed)?;
        writeln!(f, "kept        : {}", self.table.len())?;
        writeln!(f, "suppressed  : {}", self.suppressed.len())?;
        writeln!(f, "failed      : {}", self.failures.len())?;
        writeln!(f, "warnings    : {}", self.warnings.len())?;
        write!(
            f,
            "interrupted : {}",
            if self.interrupted { "yes" } else { "no" }
        )?;

        if f.alternate() {
            for failure in &self.failures {
                write!(f, "\n  failure: {failure}")?;
            }
            for w in &self.warnings {
                write!(f, "\n  warning: {w}")?;
            }
            write!(f, "\n{:#}", self.table)?;
        }
        Ok(())
    }
}

/// Score `ids` in order, loading each series from `loader`.
///
/// Return
/// ----------
/// * The [`RunReport`]; per-object problems are inside it.
/// * `Err` only if the final table cannot be built.
pub fn run_batch<'a, L, I>(
    loader: &L,
    ids: I,
    params: &ScoringParams,
) -> Result<RunReport, SnapsError>
where
    L: SeriesLoader + ?Sized,
    I: IntoIterator<Item = &'a ObjectNumber>,
{
    let mut run = AnomalyRun::new(params.clone());
    for object in ids {
        run.process_loaded(loader, object);
    }
    run.finish()
}

/// Full diagnostics of one object.
#[derive(Debug)]
pub struct ObjectInspection {
    pub object: ObjectNumber,
    pub n_obs: usize,
    /// Per attribute of interest; `None` when neutralised.
    pub sigmas: Vec<(Attribute, Option<AttributeSigma>)>,
    /// The row the run would produce, before the policy is applied.
    pub row: SigmaRow,
    /// Rating of the series, when computable.
    pub rating: Option<RatingOutcome>,
    /// Whether the active policy keeps the row.
    pub kept: bool,
    pub warnings: Vec<AttributeWarning>,
}

/// Inspect a single object: every attribute's statistics, its trigger and the rating.
///
/// The rating is computed whatever the active policy. When the policy does not use it, a
/// rating failure only leaves [`ObjectInspection::rating`] empty and adds a warning.
///
/// Return
/// ----------
/// * `Err` for non-finite attribute values, or a rating failure the policy depends on.
pub fn inspect_object(
    object: &ObjectNumber,
    series: &[Observation],
    params: &ScoringParams,
) -> Result<ObjectInspection, SnapsError> {
    let rating_mode = if params.filter.computes_rating() {
        RatingMode::Required
    } else {
        RatingMode::BestEffort
    };
    let eval = evaluate(object, series, params, rating_mode)?;
    let cells = eval.cells();
    let policy_rating = if params.filter.computes_rating() {
        eval.rating.as_ref().map(|r| r.rating)
    } else {
        None
    };
    let kept = apply_policy(&params.filter, &cells, policy_rating).keep;

    Ok(ObjectInspection {
        object: object.clone(),
        n_obs: series.len(),
        row: SigmaRow::new(object.clone(), cells, eval.sums, policy_rating),
        sigmas: eval.sigmas,
        rating: eval.rating,
        kept,
        warnings: eval.warnings,
    })
}

impl fmt::Display for ObjectInspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Object {} ({} observations)", self.object, self.n_obs)?;

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "Attribute", "Mean", "Stdev", "Extreme", "Dir", "Sigma", "Night", "Source id",
            ]);

        for (attr, s) in &self.sigmas {
            match s {
                Some(s) => table.add_row(vec![
                    Cell::new(attr),
                    Cell::new(format!("{:.4}", s.mean)),
                    Cell::new(format!("{:.4}", s.stdev)),
                    Cell::new(format!("{:.4}", s.extreme_value)),
                    Cell::new(s.direction),
                    Cell::new(format!("{:+.4}", s.signed_sigma)),
                    Cell::new(s.trigger_night),
                    Cell::new(&s.trigger_source_id),
                ]),
                None => table.add_row(vec![
                    Cell::new(attr),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new(format!("{:+.4}", 0.0)),
                    Cell::new("-"),
                    Cell::new("-"),
                ]),
            };
        }
        writeln!(f, "{table}")?;

        writeln!(f, "Row Sum     : {:+.4}", self.row.row_sum())?;
        writeln!(f, "Abs Row Sum : {:.4}", self.row.abs_row_sum())?;
        match &self.rating {
            Some(r) => writeln!(f, "Rating      : {:.2} (peak {})", r.rating, r.peak_source_id)?,
            None => writeln!(f, "Rating      : -")?,
        }
        write!(f, "Kept        : {}", if self.kept { "yes" } else { "no" })
    }
}
