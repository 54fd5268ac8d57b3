//! # Per-attribute sigma scoring
//!
//! For one object series and one attribute, the [`SigmaScorer`] measures how far the
//! most extreme observation lies from the series mean, in units of the series' sample
//! standard deviation.
//!
//! ## Algorithm
//! -----------------
//! 1. `mean` and sample `stdev` of the attribute over the observations that carry it.
//! 2. Stable ascending sort; `minVal` is the first entry, `maxVal` the last.
//!    With [`ExtremeMode::Smoothed`] each extreme is the mean of the extreme value and its
//!    two nearest-ranked neighbours.
//! 3. `high = (maxVal − mean) / stdev`, `low = (mean − minVal) / stdev`.
//! 4. If `high > low` the stored sigma is `+high × weight` and the maximum observation is the
//!    trigger; otherwise it is `−low × weight` and the minimum observation is the trigger.
//!
//! The sign therefore tells which tail is the more extreme one.
//!
//! ## Errors
//! -----------------
//! * [`SnapsError::InsufficientData`] – fewer than 2 observations carry the attribute
//!   (3 when smoothing).
//! * [`SnapsError::DegenerateRange`] – zero standard deviation.
//! * [`SnapsError::NonFiniteValue`] – a carried value is NaN or infinite.
//!
//! The first two are meant to be neutralised by the caller (sigma = 0); the last one rejects
//! the object's row. Observations without a value for the attribute are left out.
use std::fmt;

use serde::{Deserialize, Serialize};

use super::stats::{ascending_order, mean, sample_stdev};
use super::ScoringParams;
use crate::constants::{JulianDate, NightKey, Sigma, SMOOTHING_WIDTH};
use crate::observations::series_ext::SeriesExt;
use crate::observations::{Attribute, GroupKey, Observation, TriggerKey};
use crate::snaps_errors::SnapsError;

/// How the extreme values of a series are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtremeMode {
    /// Single most extreme observation on each side.
    #[default]
    Single,
    /// Mean of the extreme and its two nearest-ranked neighbours on each side.
    Smoothed,
}

impl ExtremeMode {
    /// Fewest observations carrying an attribute for it to be scored.
    pub fn min_values(self) -> usize {
        match self {
            ExtremeMode::Single => 2,
            ExtremeMode::Smoothed => SMOOTHING_WIDTH.max(2),
        }
    }
}

/// Tail of the distribution that produced the stored sigma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    High,
    Low,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::High => f.write_str("high"),
            Direction::Low => f.write_str("low"),
        }
    }
}

/// Outcome of scoring one attribute of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSigma {
    pub attribute: Attribute,
    /// Signed, weighted sigma stored in the table.
    pub signed_sigma: Sigma,
    pub direction: Direction,
    /// Unweighted distance of the maximum from the mean, in stdev units.
    pub high_sigma: f64,
    /// Unweighted distance of the minimum from the mean, in stdev units.
    pub low_sigma: f64,
    pub mean: f64,
    pub stdev: f64,
    /// Extreme value used on the selected side (smoothed when requested).
    pub extreme_value: f64,
    /// Index of the triggering observation in the series.
    pub trigger_index: usize,
    pub trigger_source_id: String,
    pub trigger_key: GroupKey,
    pub trigger_night: NightKey,
    pub trigger_jd: JulianDate,
}

/// Sigma scorer configured with the extreme mode and the trigger grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SigmaScorer {
    pub extreme_mode: ExtremeMode,
    pub trigger_key: TriggerKey,
}

impl SigmaScorer {
    pub fn new(extreme_mode: ExtremeMode, trigger_key: TriggerKey) -> Self {
        SigmaScorer {
            extreme_mode,
            trigger_key,
        }
    }

    pub fn from_params(params: &ScoringParams) -> Self {
        Self::new(params.extreme_mode, params.trigger_key)
    }

    /// Score `attribute` over `series` with the given weight.
    ///
    /// Arguments
    /// -----------------
    /// * `series` – observations of a single object, in ingestion order.
    /// * `attribute` – attribute to score; observations without a value are skipped.
    /// * `weight` – multiplier applied to the stored sigma.
    ///
    /// Return
    /// ----------
    /// * The [`AttributeSigma`] with the signed sigma and the triggering observation.
    ///
    /// See also
    /// ------------
    /// * [`aggregate`](crate::scoring::aggregate) – Row sums over the stored sigmas.
    pub fn score(
        &self,
        series: &[Observation],
        attribute: &Attribute,
        weight: f64,
    ) -> Result<AttributeSigma, SnapsError> {
        let (positions, values): (Vec<usize>, Vec<f64>) =
            series.present_values(attribute)?.into_iter().unzip();
        if values.len() < self.extreme_mode.min_values() {
            return Err(SnapsError::InsufficientData {
                attribute: attribute.to_string(),
                count: values.len(),
            });
        }

        let (m, sd) = match (mean(&values), sample_stdev(&values)) {
            (Some(m), Some(sd)) => (m, sd),
            _ => {
                return Err(SnapsError::InsufficientData {
                    attribute: attribute.to_string(),
                    count: values.len(),
                })
            }
        };
        if sd == 0.0 || !sd.is_finite() {
            return Err(SnapsError::DegenerateRange {
                attribute: attribute.to_string(),
            });
        }

        let order = ascending_order(&values);
        let n = order.len();
        let min_idx = positions[order[0]];
        let max_idx = positions[order[n - 1]];

        let (min_val, max_val) = match self.extreme_mode {
            ExtremeMode::Single => (values[order[0]], values[order[n - 1]]),
            ExtremeMode::Smoothed => {
                let w = SMOOTHING_WIDTH;
                let low: f64 = order[..w].iter().map(|&i| values[i]).sum::<f64>() / w as f64;
                let high: f64 = order[n - w..].iter().map(|&i| values[i]).sum::<f64>() / w as f64;
                (low, high)
            }
        };

        let high_sigma = (max_val - m) / sd;
        let low_sigma = (m - min_val) / sd;

        let (direction, signed_sigma, trigger_index, extreme_value) = if high_sigma > low_sigma {
            (Direction::High, high_sigma * weight, max_idx, max_val)
        } else {
            (Direction::Low, -low_sigma * weight, min_idx, min_val)
        };

        let trigger = &series[trigger_index];
        Ok(AttributeSigma {
            attribute: attribute.clone(),
            signed_sigma,
            direction,
            high_sigma,
            low_sigma,
            mean: m,
            stdev: sd,
            extreme_value,
            trigger_index,
            trigger_source_id: trigger.source_id.clone(),
            trigger_key: trigger.group_key(self.trigger_key),
            trigger_night: trigger.night,
            trigger_jd: trigger.jd,
        })
    }
}

#[cfg(test)]
mod test_sigma {
    use super::*;
    use approx::assert_relative_eq;

    fn series_of(values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Observation::new(2460000.5 + i as f64, 100 + i as i64, format!("cand-{i}"), 1)
                    .with_value(Attribute::Elong, v)
            })
            .collect()
    }

    #[test]
    fn test_high_tail_outlier() {
        let series = series_of(&[1.0, 1.2, 1.1, 1.3, 9.0]);
        let s = SigmaScorer::default()
            .score(&series, &Attribute::Elong, 1.0)
            .unwrap();

        let sd = (49.348f64 / 4.0).sqrt();
        assert_eq!(s.direction, Direction::High);
        assert_relative_eq!(s.mean, 2.72, epsilon = 1e-12);
        assert_relative_eq!(s.stdev, sd, epsilon = 1e-12);
        assert_relative_eq!(s.signed_sigma, (9.0 - 2.72) / sd, epsilon = 1e-12);
        assert_relative_eq!(s.low_sigma, (2.72 - 1.0) / sd, epsilon = 1e-12);
        assert_eq!(s.trigger_index, 4);
        assert_eq!(s.trigger_source_id, "cand-4");
        assert_eq!(s.trigger_key, GroupKey::Night(104));
        assert_eq!(s.extreme_value, 9.0);
    }

    #[test]
    fn test_low_tail_is_negative_and_weighted() {
        let series = series_of(&[5.0, 5.1, 4.9, 5.05, -3.0]);
        let s = SigmaScorer::default()
            .score(&series, &Attribute::Elong, 2.0)
            .unwrap();

        assert_eq!(s.direction, Direction::Low);
        assert!(s.signed_sigma < 0.0);
        assert_relative_eq!(s.signed_sigma, -2.0 * s.low_sigma, epsilon = 1e-12);
        assert_eq!(s.trigger_source_id, "cand-4");
    }

    #[test]
    fn test_tie_goes_to_low_tail() {
        // symmetric series: high == low
        let series = series_of(&[0.0, 1.0, 2.0]);
        let s = SigmaScorer::default()
            .score(&series, &Attribute::Elong, 1.0)
            .unwrap();
        assert_eq!(s.direction, Direction::Low);
        assert_eq!(s.trigger_index, 0);
    }

    #[test]
    fn test_epoch_trigger_key() {
        let series = series_of(&[1.0, 2.0, 10.0]);
        let s = SigmaScorer::new(ExtremeMode::Single, TriggerKey::Epoch)
            .score(&series, &Attribute::Elong, 1.0)
            .unwrap();
        assert_eq!(s.trigger_key, GroupKey::epoch(2460002.5));
    }

    #[test]
    fn test_smoothed_extremes() {
        let series = series_of(&[0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0]);
        let s = SigmaScorer::new(ExtremeMode::Smoothed, TriggerKey::Night)
            .score(&series, &Attribute::Elong, 1.0)
            .unwrap();

        assert_eq!(s.direction, Direction::High);
        assert_relative_eq!(s.extreme_value, 10.0, epsilon = 1e-12);
        assert_relative_eq!(s.high_sigma, 6.25 / s.stdev, epsilon = 1e-12);
        assert_relative_eq!(s.low_sigma, 3.75 / s.stdev, epsilon = 1e-12);
        // last of the tied maxima in ingestion order
        assert_eq!(s.trigger_index, 7);

        let short = series_of(&[1.0, 2.0]);
        assert_eq!(
            SigmaScorer::new(ExtremeMode::Smoothed, TriggerKey::Night)
                .score(&short, &Attribute::Elong, 1.0),
            Err(SnapsError::InsufficientData {
                attribute: "elong".into(),
                count: 2
            })
        );
    }

    #[test]
    fn test_error_cases() {
        let scorer = SigmaScorer::default();
        assert_eq!(
            scorer.score(&series_of(&[1.0]), &Attribute::Elong, 1.0),
            Err(SnapsError::InsufficientData {
                attribute: "elong".into(),
                count: 1
            })
        );
        assert_eq!(
            scorer.score(&series_of(&[2.0, 2.0, 2.0]), &Attribute::Elong, 1.0),
            Err(SnapsError::DegenerateRange {
                attribute: "elong".into()
            })
        );
        assert_eq!(
            scorer.score(&series_of(&[1.0, 2.0]), &Attribute::RealBogus, 1.0),
            Err(SnapsError::InsufficientData {
                attribute: "rb".into(),
                count: 0
            })
        );
        assert!(matches!(
            scorer.score(&series_of(&[1.0, f64::INFINITY, 2.0]), &Attribute::Elong, 1.0),
            Err(SnapsError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_unmeasured_observations_are_skipped() {
        let mut series = series_of(&[1.0, 0.0, 1.2, 0.0, 1.1, 1.3, 9.0]);
        series[1] = Observation::new(2460001.5, 101, "gap-1", 1);
        series[3] = Observation::new(2460003.5, 103, "gap-3", 1);

        let s = SigmaScorer::default()
            .score(&series, &Attribute::Elong, 1.0)
            .unwrap();
        let sd = (49.348f64 / 4.0).sqrt();
        assert_relative_eq!(s.mean, 2.72, epsilon = 1e-12);
        assert_relative_eq!(s.signed_sigma, (9.0 - 2.72) / sd, epsilon = 1e-12);
        assert_eq!(s.trigger_index, 6);
        assert_eq!(s.trigger_source_id, "cand-6");

        // only one measured value left
        let sparse: Vec<_> = series
            .iter()
            .enumerate()
            .map(|(i, o)| {
                if i == 2 {
                    o.clone()
                } else {
                    Observation::new(o.jd, o.night, o.source_id.clone(), 1)
                }
            })
            .collect();
        assert_eq!(
            SigmaScorer::default().score(&sparse, &Attribute::Elong, 1.0),
            Err(SnapsError::InsufficientData {
                attribute: "elong".into(),
                count: 1
            })
        );
    }
}
