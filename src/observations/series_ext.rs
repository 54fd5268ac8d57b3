//! Helpers on a whole object series.
//!
//! [`SeriesExt`] is implemented for `[Observation]`, so it applies to
//! [`ObjectSeries`](crate::constants::ObjectSeries) and plain vectors alike.
use itertools::Itertools;

use super::{Attribute, Observation};
use crate::snaps_errors::SnapsError;

pub trait SeriesExt {
    /// Values of `attribute` on the observations that carry one, with their series index.
    ///
    /// Observations without a value are skipped: the attribute was not measured there.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::NonFiniteValue)` if a carried value is NaN or infinite.
    fn present_values(&self, attribute: &Attribute) -> Result<Vec<(usize, f64)>, SnapsError>;

    /// Stable sort by epoch; observations sharing an epoch keep their ingestion order.
    fn sort_by_epoch(&mut self);

    /// Whether epochs are non-decreasing.
    fn is_time_ordered(&self) -> bool;

    /// Distinct night keys, ascending.
    fn nights(&self) -> Vec<i64>;
}

impl SeriesExt for [Observation] {
    fn present_values(&self, attribute: &Attribute) -> Result<Vec<(usize, f64)>, SnapsError> {
        self.iter()
            .enumerate()
            .filter(|(_, o)| o.value(attribute).is_some())
            .map(|(i, o)| o.require_value(attribute).map(|v| (i, v)))
            .collect()
    }

    fn sort_by_epoch(&mut self) {
        self.sort_by(|a, b| a.jd.total_cmp(&b.jd));
    }

    fn is_time_ordered(&self) -> bool {
        self.iter().tuple_windows().all(|(a, b)| a.jd <= b.jd)
    }

    fn nights(&self) -> Vec<i64> {
        self.iter().map(|o| o.night).sorted_unstable().dedup().collect()
    }
}
