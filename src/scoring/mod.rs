//! # Anomaly scoring parameters
//!
//! This module defines the [`ScoringParams`] configuration struct and its builder, which
//! control how each object series is scored, rated and filtered.
//!
//! ## Purpose
//!
//! The [`ScoringParams`] object centralizes every tunable of a run. It allows you to:
//!
//! - Choose the **attributes of interest** and their column order,
//! - Weight individual attributes (default weight `1.0`),
//! - Select the **extreme mode** (single extreme or smoothed extremes),
//! - Select the **trigger key** used to decide whether two attributes were triggered by the
//!   same observation (night or exact epoch),
//! - Define the **rated subset** and the polarity of each rated attribute,
//! - Pick the **filter policy** that decides row retention.
//!
//! ## Pipeline overview
//!
//! 1. **Sigma scoring** ([`sigma`])
//!    For every attribute of interest, the signed weighted sigma of the most extreme
//!    observation and its trigger.
//!
//! 2. **Aggregation** ([`aggregate`])
//!    Signed and absolute row sums.
//!
//! 3. **Rating** ([`rating`])
//!    Per-object min-max normalised rating on `[0, 100]`, only for the rating policy.
//!
//! 4. **Retention** ([`crate::filter::policy`])
//!    Zeroing and suppression decided by the filter policy.
//!
//! Sub-modules [`stats`] and [`census`] hold the descriptive statistics and the k-sigma
//! outlier census.
//!
//! ## Example
//!
//! ```rust,no_run
//! use snaps::filter::FilterPolicy;
//! use snaps::observations::Attribute;
//! use snaps::scoring::ScoringParams;
//!
//! let params = ScoringParams::builder()
//!     .weight(Attribute::RealBogus, 2.0)
//!     .filter(FilterPolicy::OccurrenceCount { threshold: 2 })
//!     .build()
//!     .unwrap();
//!
//! println!("{params:#}");
//! ```
pub mod aggregate;
pub mod census;
pub mod rating;
pub mod sigma;
pub mod stats;

use std::cmp::Ordering::{Equal, Greater, Less};
use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::constants::RATING_SCALE;
use crate::filter::FilterPolicy;
use crate::observations::{Attribute, TriggerKey};
use crate::snaps_errors::SnapsError;
use rating::RatedAttribute;
use sigma::ExtremeMode;

/// Configuration of a scoring run.
///
/// Fields
/// -----------------
/// * `attributes` – attributes of interest, in table column order.
/// * `weights` – per-attribute sigma multipliers; missing entries weigh `1.0`.
/// * `filter` – row retention policy.
/// * `rated_attributes` – rated subset with polarity.
/// * `extreme_mode` – single or smoothed extremes.
/// * `trigger_key` – grouping key of triggering observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    pub attributes: Vec<Attribute>,
    pub weights: HashMap<Attribute, f64, RandomState>,
    pub filter: FilterPolicy,
    pub rated_attributes: Vec<RatedAttribute>,
    pub extreme_mode: ExtremeMode,
    pub trigger_key: TriggerKey,
}

impl ScoringParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ScoringParamsBuilder {
        ScoringParamsBuilder::new()
    }

    /// Weight of `attribute` (`1.0` when not configured).
    pub fn weight(&self, attribute: &Attribute) -> f64 {
        self.weights.get(attribute).copied().unwrap_or(1.0)
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        ScoringParams {
            attributes: Attribute::defaults(),
            weights: HashMap::default(),
            filter: FilterPolicy::None,
            rated_attributes: RatedAttribute::defaults(),
            extreme_mode: ExtremeMode::Single,
            trigger_key: TriggerKey::Night,
        }
    }
}

/// Builder for [`ScoringParams`], with validation.
#[derive(Debug, Clone)]
pub struct ScoringParamsBuilder {
    params: ScoringParams,
}

impl Default for ScoringParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: ScoringParams::default(),
        }
    }

    pub fn attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = Attribute>,
    {
        self.params.attributes = attributes.into_iter().collect();
        self
    }

    pub fn weight(mut self, attribute: Attribute, weight: f64) -> Self {
        self.params.weights.insert(attribute, weight);
        self
    }

    pub fn filter(mut self, policy: FilterPolicy) -> Self {
        self.params.filter = policy;
        self
    }

    pub fn rated_attributes<I>(mut self, rated: I) -> Self
    where
        I: IntoIterator<Item = RatedAttribute>,
    {
        self.params.rated_attributes = rated.into_iter().collect();
        self
    }

    pub fn extreme_mode(mut self, mode: ExtremeMode) -> Self {
        self.params.extreme_mode = mode;
        self
    }

    pub fn trigger_key(mut self, key: TriggerKey) -> Self {
        self.params.trigger_key = key;
        self
    }

    // ---- Numeric helpers for PartialOrd (handle NaN as invalid) ----

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff lo <= x <= hi and comparable (i.e., not NaN).
    #[inline]
    fn within(x: f64, lo: f64, hi: f64) -> bool {
        matches!(x.partial_cmp(&lo), Some(Greater) | Some(Equal))
            && matches!(x.partial_cmp(&hi), Some(Less) | Some(Equal))
    }

    /// Finalize the builder and produce a [`ScoringParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `attributes` is non-empty and free of duplicates.
    /// * every weight is finite and `> 0`, and refers to an attribute of interest.
    /// * `rated_attributes` is non-empty and free of duplicates.
    /// * `OccurrenceCount { threshold }` has `1 <= threshold <= attributes.len()`.
    /// * `RatingThreshold { threshold }` has `0 <= threshold <= 100`.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::InvalidParameter)` describing the first violated rule.
    pub fn build(self) -> Result<ScoringParams, SnapsError> {
        let p = &self.params;

        if p.attributes.is_empty() {
            return Err(SnapsError::InvalidParameter(
                "at least one attribute of interest is required".into(),
            ));
        }
        if let Some(dup) = p.attributes.iter().duplicates().next() {
            return Err(SnapsError::InvalidParameter(format!(
                "attribute '{dup}' is listed more than once"
            )));
        }

        for (attr, w) in p.weights.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            if !p.attributes.contains(attr) {
                return Err(SnapsError::InvalidParameter(format!(
                    "weight given for '{attr}', which is not an attribute of interest"
                )));
            }
            if !(w.is_finite() && Self::gt0(*w)) {
                return Err(SnapsError::InvalidParameter(format!(
                    "weight of '{attr}' must be a positive finite number, got {w}"
                )));
            }
        }

        if p.rated_attributes.is_empty() {
            return Err(SnapsError::InvalidParameter(
                "the rated attribute subset must not be empty".into(),
            ));
        }
        if let Some(dup) = p
            .rated_attributes
            .iter()
            .map(|r| &r.attribute)
            .duplicates()
            .next()
        {
            return Err(SnapsError::InvalidParameter(format!(
                "rated attribute '{dup}' is listed more than once"
            )));
        }

        match p.filter {
            FilterPolicy::OccurrenceCount { threshold } => {
                if threshold == 0 || threshold > p.attributes.len() {
                    return Err(SnapsError::InvalidParameter(format!(
                        "occurrence threshold must be in [1, {}], got {threshold}",
                        p.attributes.len()
                    )));
                }
            }
            FilterPolicy::RatingThreshold { threshold } => {
                if !Self::within(threshold, 0.0, RATING_SCALE) {
                    return Err(SnapsError::InvalidParameter(format!(
                        "rating threshold must be in [0, {RATING_SCALE}], got {threshold}"
                    )));
                }
            }
            FilterPolicy::Weighted | FilterPolicy::None => {}
        }

        Ok(self.params)
    }
}

impl fmt::Display for ScoringParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = self.attributes.iter().map(|a| a.name()).join(", ");
        let rated = self
            .rated_attributes
            .iter()
            .map(|r| match r.polarity {
                rating::Polarity::HigherIsMoreAnomalous => format!("{}(+)", r.attribute),
                rating::Polarity::LowerIsMoreAnomalous => format!("{}(-)", r.attribute),
            })
            .join(", ");

        if f.alternate() {
            const PARAM_COL: usize = 44; // width reserved for "name = value"
            writeln!(f, "Anomaly Scoring Parameters")?;
            writeln!(f, "--------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Sigma scoring]")?;
            line!("attributes   = {}", attrs, "Attributes of interest")?;
            for a in &self.attributes {
                line!(
                    "weight.{}",
                    format!("{:<6}= {:.3}", a.name(), self.weight(a)),
                    "Sigma multiplier"
                )?;
            }
            line!("extreme_mode = {:?}", self.extreme_mode, "Extreme selection")?;
            line!("trigger_key  = {:?}", self.trigger_key, "Trigger grouping")?;

            writeln!(f, "\n[Rating / filtering]")?;
            line!("rated        = {}", rated, "Rated subset and polarity")?;
            line!("filter       = {}", self.filter, "Row retention policy")?;

            Ok(())
        } else {
            write!(
                f,
                "ScoringParams(attributes=[{attrs}], filter={}, rated=[{rated}], extreme={:?}, trigger={:?})",
                self.filter, self.extreme_mode, self.trigger_key
            )
        }
    }
}
