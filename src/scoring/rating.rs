//! # Anomaly rating
//!
//! The rating condenses a subset of attributes into one number on `[0, 100]`:
//!
//! 1. every rated attribute is min-max normalised over the observations of the object that
//!    carry it;
//! 2. each observation scores the mean, over the rated attributes it carries, of `norm`
//!    (for attributes where a high value is anomalous) or `1 − norm` (where a low value is
//!    anomalous); an observation carrying none of them scores `0`;
//! 3. the rating is `100 ×` the best observation score.
//!
//! Normalisation is **per object**, so ratings compare how far each object's worst
//! observation sits inside its own range, not absolute attribute values.
//!
//! An attribute whose values are all equal contributes the neutral value `0` to every
//! observation score and is reported in [`RatingOutcome::degenerate`].
use serde::{Deserialize, Serialize};

use super::stats::min_max_normalize;
use super::ScoringParams;
use crate::constants::{Rating, RATING_SCALE};
use crate::observations::series_ext::SeriesExt;
use crate::observations::{Attribute, Observation};
use crate::snaps_errors::SnapsError;

/// Which tail of an attribute counts as anomalous for the rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    HigherIsMoreAnomalous,
    LowerIsMoreAnomalous,
}

/// One attribute of the rated subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedAttribute {
    pub attribute: Attribute,
    pub polarity: Polarity,
}

impl RatedAttribute {
    pub fn new(attribute: Attribute, polarity: Polarity) -> Self {
        RatedAttribute {
            attribute,
            polarity,
        }
    }

    /// Default rated subset: elongation (high), real/bogus (low), aperture ratio (high).
    pub fn defaults() -> Vec<RatedAttribute> {
        vec![
            RatedAttribute::new(Attribute::Elong, Polarity::HigherIsMoreAnomalous),
            RatedAttribute::new(Attribute::RealBogus, Polarity::LowerIsMoreAnomalous),
            RatedAttribute::new(Attribute::Mag18oMag8, Polarity::HigherIsMoreAnomalous),
        ]
    }
}

/// Result of rating one series.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingOutcome {
    pub rating: Rating,
    /// Index of the first observation reaching the best score.
    pub peak_index: usize,
    pub peak_source_id: String,
    /// Per-observation scores on `[0, 1]`, in series order.
    pub observation_scores: Vec<f64>,
    /// Rated attributes whose values had no spread.
    pub degenerate: Vec<Attribute>,
    /// Rated attributes carried by no observation of the series.
    pub unobserved: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnomalyRater {
    rated: Vec<RatedAttribute>,
}

impl AnomalyRater {
    pub fn new(rated: Vec<RatedAttribute>) -> Self {
        AnomalyRater { rated }
    }

    pub fn from_params(params: &ScoringParams) -> Self {
        Self::new(params.rated_attributes.clone())
    }

    pub fn rated(&self) -> &[RatedAttribute] {
        &self.rated
    }

    /// Rate a single object series.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::InsufficientData)` – empty series, empty rated subset, or no
    ///   observation carrying any rated attribute.
    /// * `Err(SnapsError::NonFiniteValue)` – a carried value is NaN or infinite.
    pub fn rate(&self, series: &[Observation]) -> Result<RatingOutcome, SnapsError> {
        if series.is_empty() || self.rated.is_empty() {
            return Err(SnapsError::InsufficientData {
                attribute: self
                    .rated
                    .first()
                    .map(|r| r.attribute.to_string())
                    .unwrap_or_else(|| "rating".to_string()),
                count: series.len(),
            });
        }

        let mut scores = vec![0.0; series.len()];
        let mut carried = vec![0usize; series.len()];
        let mut degenerate = Vec::new();
        let mut unobserved = Vec::new();

        for rated in &self.rated {
            let present = series.present_values(&rated.attribute)?;
            if present.is_empty() {
                unobserved.push(rated.attribute.clone());
                continue;
            }
            for &(i, _) in &present {
                carried[i] += 1;
            }

            let values: Vec<f64> = present.iter().map(|&(_, v)| v).collect();
            match min_max_normalize(&values) {
                Some(norm) => {
                    for (&(i, _), n) in present.iter().zip(norm) {
                        scores[i] += match rated.polarity {
                            Polarity::HigherIsMoreAnomalous => n,
                            Polarity::LowerIsMoreAnomalous => 1.0 - n,
                        };
                    }
                }
                None => degenerate.push(rated.attribute.clone()),
            }
        }

        if unobserved.len() == self.rated.len() {
            return Err(SnapsError::InsufficientData {
                attribute: self.rated[0].attribute.to_string(),
                count: 0,
            });
        }

        for (score, &k) in scores.iter_mut().zip(&carried) {
            *score = if k == 0 {
                0.0
            } else {
                (*score / k as f64).clamp(0.0, 1.0)
            };
        }

        let (peak_index, best) = scores
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
                if v > bv {
                    (i, v)
                } else {
                    (bi, bv)
                }
            });

        Ok(RatingOutcome {
            rating: best * RATING_SCALE,
            peak_index,
            peak_source_id: series[peak_index].source_id.clone(),
            observation_scores: scores,
            degenerate,
            unobserved,
        })
    }
}
