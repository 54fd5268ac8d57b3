//! Descriptive statistics over one attribute of one series.
//!
//! All helpers work on plain `f64` slices and return `None` instead of producing NaN
//! when the input does not support the statistic.
use std::cmp::Ordering;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n − 1` denominator), `None` below two values.
///
/// Uses a two-pass computation around the mean.
pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Smallest and largest value, `None` for an empty slice.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Min-max normalisation into `[0, 1]`.
///
/// Return
/// ----------
/// * `None` when the slice is empty or all values are equal.
pub fn min_max_normalize(values: &[f64]) -> Option<Vec<f64>> {
    let (lo, hi) = min_max(values)?;
    let span = hi - lo;
    if span.partial_cmp(&0.0) != Some(Ordering::Greater) {
        return None;
    }
    Some(
        values
            .iter()
            .map(|v| ((v - lo) / span).clamp(0.0, 1.0))
            .collect(),
    )
}

/// Indices of `values` in ascending value order.
///
/// The sort is stable: equal values keep their original relative order, so the
/// first-ingested observation wins ties for the minimum and the last-ingested one
/// for the maximum.
pub fn ascending_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}
