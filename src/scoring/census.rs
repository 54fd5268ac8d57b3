//! k-sigma outlier census for one attribute of one series.
//!
//! Counts the observations lying more than `k` sample standard deviations away from the
//! series mean: `|mean − v| > k · stdev`. Only observations carrying the attribute take part. This is a diagnostic companion to the sigma
//! score, which only looks at the single most extreme observation.
use std::fmt;

use super::stats::{mean, sample_stdev};
use crate::observations::series_ext::SeriesExt;
use crate::observations::{Attribute, Observation};
use crate::snaps_errors::SnapsError;

#[derive(Debug, Clone, PartialEq)]
pub struct OutlierCensus {
    pub attribute: Attribute,
    pub k: f64,
    pub mean: f64,
    pub stdev: f64,
    pub low_cutoff: f64,
    pub high_cutoff: f64,
    /// Indices of the outlying observations, in series order.
    pub outliers: Vec<usize>,
    /// Observations carrying the attribute.
    pub total: usize,
}

impl OutlierCensus {
    pub fn count(&self) -> usize {
        self.outliers.len()
    }

    /// Share of the series flagged as outliers.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.outliers.len() as f64 / self.total as f64
        }
    }
}

impl fmt::Display for OutlierCensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} outside [{:.4}, {:.4}] (mean={:.4}, stdev={:.4}, k={})",
            self.attribute,
            self.count(),
            self.total,
            self.low_cutoff,
            self.high_cutoff,
            self.mean,
            self.stdev,
            self.k
        )
    }
}

/// Run the census on `attribute` with multiplier `k`.
///
/// Return
/// ----------
/// * `Err(SnapsError::InvalidParameter)` – `k` is not a positive finite number.
/// * `Err(SnapsError::InsufficientData)` – fewer than 2 observations carry the attribute.
/// * `Err(SnapsError::NonFiniteValue)` – a carried value is NaN or infinite.
pub fn outlier_census(
    series: &[Observation],
    attribute: &Attribute,
    k: f64,
) -> Result<OutlierCensus, SnapsError> {
    if !(k.is_finite() && k > 0.0) {
        return Err(SnapsError::InvalidParameter(format!(
            "outlier multiplier must be a positive finite number, got {k}"
        )));
    }
    let (positions, values): (Vec<usize>, Vec<f64>) =
        series.present_values(attribute)?.into_iter().unzip();
    let (m, sd) = match (mean(&values), sample_stdev(&values)) {
        (Some(m), Some(sd)) => (m, sd),
        _ => {
            return Err(SnapsError::InsufficientData {
                attribute: attribute.to_string(),
                count: values.len(),
            })
        }
    };

    let spread = k * sd;
    let outliers = positions
        .iter()
        .zip(&values)
        .filter(|(_, v)| (m - **v).abs() > spread)
        .map(|(&i, _)| i)
        .collect();

    Ok(OutlierCensus {
        attribute: attribute.clone(),
        k,
        mean: m,
        stdev: sd,
        low_cutoff: m - spread,
        high_cutoff: m + spread,
        outliers,
        total: values.len(),
    })
}
