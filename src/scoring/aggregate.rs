//! Row-level aggregation of signed sigmas.
//!
//! * `row_sum` keeps the signs: a row whose extremes sit on the high tail sums positive.
//! * `abs_row_sum` measures total deviation irrespective of direction.
//!
//! `abs_row_sum >= |row_sum|` always holds, with equality iff all non-zero sigmas share
//! one sign.
use serde::{Deserialize, Serialize};

use crate::constants::Sigma;

/// Signed and absolute sums of one row's sigmas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RowSums {
    pub row_sum: f64,
    pub abs_row_sum: f64,
}

impl RowSums {
    pub fn from_sigmas<I>(sigmas: I) -> Self
    where
        I: IntoIterator<Item = Sigma>,
    {
        sigmas
            .into_iter()
            .fold(RowSums::default(), |acc, s| RowSums {
                row_sum: acc.row_sum + s,
                abs_row_sum: acc.abs_row_sum + s.abs(),
            })
    }
}

/// Aggregate a slice of signed sigmas.
pub fn aggregate(sigmas: &[Sigma]) -> RowSums {
    RowSums::from_sigmas(sigmas.iter().copied())
}
