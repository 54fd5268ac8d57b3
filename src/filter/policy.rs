//! # Row retention policies
//!
//! A [`FilterPolicy`] decides, for one scored object, whether its row enters the ranked
//! table and in which form. Dispatch is the pure function [`apply_policy`].
//!
//! | Policy | Rule |
//! |---|---|
//! | [`FilterPolicy::OccurrenceCount`] | zero every cell whose trigger group is shared by fewer than `threshold` attributes; suppress the row when more than `threshold` cells were zeroed |
//! | [`FilterPolicy::RatingThreshold`] | suppress the row when its rating is below `threshold` |
//! | [`FilterPolicy::Weighted`] | keep (reserved) |
//! | [`FilterPolicy::None`] | keep |
//!
//! Suppressed rows are stripped from the table, never kept as zero rows.
use std::fmt;

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::Rating;
use crate::observations::GroupKey;
use crate::table::row::SigmaCell;

/// Row retention policy, with its own parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FilterPolicy {
    /// Keep cells whose triggering observation is shared by at least `threshold` attributes.
    OccurrenceCount { threshold: usize },
    /// Keep rows whose rating is at least `threshold` (on `[0, 100]`).
    RatingThreshold { threshold: Rating },
    /// Reserved weighted mode; currently keeps every row.
    Weighted,
    /// Keep every row.
    #[default]
    None,
}

impl FilterPolicy {
    /// Whether rows under this policy carry a rating.
    pub fn computes_rating(&self) -> bool {
        matches!(self, FilterPolicy::RatingThreshold { .. })
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPolicy::OccurrenceCount { threshold } => {
                write!(f, "occurrence count (threshold {threshold})")
            }
            FilterPolicy::RatingThreshold { threshold } => {
                write!(f, "rating threshold ({threshold})")
            }
            FilterPolicy::Weighted => f.write_str("weighted"),
            FilterPolicy::None => f.write_str("none"),
        }
    }
}

/// Outcome of a policy on one row.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDecision {
    pub keep: bool,
    /// Cells after policy adjustment (zeroing), in input order.
    pub cells: Vec<SigmaCell>,
    /// Number of cells zeroed by the policy.
    pub zeroed: usize,
}

/// Apply `policy` to one row's cells.
///
/// Arguments
/// -----------------
/// * `policy` – the active policy.
/// * `cells` – the row's cells in attribute order.
/// * `rating` – the row's rating when the policy computes one. A missing rating under
///   [`FilterPolicy::RatingThreshold`] suppresses the row.
///
/// Notes
/// ----------
/// * Under [`FilterPolicy::OccurrenceCount`] a neutralised cell (no trigger) counts as
///   zero occurrences: it is zeroed and counted in `zeroed`.
pub fn apply_policy(
    policy: &FilterPolicy,
    cells: &[SigmaCell],
    rating: Option<Rating>,
) -> FilterDecision {
    match *policy {
        FilterPolicy::OccurrenceCount { threshold } => occurrence_count(cells, threshold),
        FilterPolicy::RatingThreshold { threshold } => FilterDecision {
            keep: rating.is_some_and(|r| r >= threshold),
            cells: cells.to_vec(),
            zeroed: 0,
        },
        FilterPolicy::Weighted | FilterPolicy::None => FilterDecision {
            keep: true,
            cells: cells.to_vec(),
            zeroed: 0,
        },
    }
}

fn occurrence_count(cells: &[SigmaCell], threshold: usize) -> FilterDecision {
    let mut counts: HashMap<GroupKey, usize, RandomState> = HashMap::default();
    for key in cells.iter().filter_map(SigmaCell::trigger_key) {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut zeroed = 0;
    let adjusted = cells
        .iter()
        .map(|c| {
            let n = c
                .trigger_key()
                .and_then(|k| counts.get(&k).copied())
                .unwrap_or(0);
            if n >= threshold {
                c.clone()
            } else {
                zeroed += 1;
                c.clone().zeroed()
            }
        })
        .collect();

    FilterDecision {
        keep: zeroed <= threshold,
        cells: adjusted,
        zeroed,
    }
}

#[cfg(test)]
mod test_policy {
    use super::*;
    use crate::observations::Attribute;
    use crate::table::row::Trigger;

    fn cell(attr: Attribute, sigma: f64, night: Option<i64>) -> SigmaCell {
        SigmaCell {
            attribute: attr,
            sigma,
            trigger: night.map(|n| Trigger {
                source_id: format!("src-{n}"),
                key: GroupKey::Night(n),
            }),
        }
    }

    fn four_cells(nights: [Option<i64>; 4]) -> Vec<SigmaCell> {
        Attribute::defaults()
            .into_iter()
            .zip(nights)
            .enumerate()
            .map(|(i, (a, n))| cell(a, 1.0 + i as f64, n))
            .collect()
    }

    #[test]
    fn test_occurrence_keeps_shared_triggers() {
        // three attributes triggered on night 5, one on night 9
        let cells = four_cells([Some(5), Some(5), Some(9), Some(5)]);
        let d = apply_policy(&FilterPolicy::OccurrenceCount { threshold: 2 }, &cells, None);

        assert!(d.keep);
        assert_eq!(d.zeroed, 1);
        let sigmas: Vec<f64> = d.cells.iter().map(|c| c.sigma).collect();
        assert_eq!(sigmas, vec![1.0, 2.0, 0.0, 4.0]);
        assert_eq!(d.cells[2].source_id(), Some("src-9"));
    }

    #[test]
    fn test_occurrence_strips_scattered_triggers() {
        let cells = four_cells([Some(1), Some(2), Some(3), Some(3)]);
        let d = apply_policy(&FilterPolicy::OccurrenceCount { threshold: 2 }, &cells, None);
        // two cells zeroed: 2 > 2 is false, row kept
        assert_eq!(d.zeroed, 2);
        assert!(d.keep);

        let cells = four_cells([Some(1), Some(2), Some(3), Some(4)]);
        let d = apply_policy(&FilterPolicy::OccurrenceCount { threshold: 2 }, &cells, None);
        assert_eq!(d.zeroed, 4);
        assert!(!d.keep);
    }

    #[test]
    fn test_occurrence_threshold_one_keeps_everything() {
        let cells = four_cells([Some(1), Some(2), Some(3), Some(4)]);
        let d = apply_policy(&FilterPolicy::OccurrenceCount { threshold: 1 }, &cells, None);
        assert!(d.keep);
        assert_eq!(d.zeroed, 0);
    }

    #[test]
    fn test_neutral_cells_count_as_zero_occurrences() {
        let cells = four_cells([None, None, Some(3), Some(3)]);
        let d = apply_policy(&FilterPolicy::OccurrenceCount { threshold: 1 }, &cells, None);
        assert_eq!(d.zeroed, 2);
        assert!(!d.keep);
    }

    #[test]
    fn test_rating_threshold() {
        let cells = four_cells([Some(1); 4]);
        let policy = FilterPolicy::RatingThreshold { threshold: 60.0 };

        assert!(apply_policy(&policy, &cells, Some(60.0)).keep);
        assert!(!apply_policy(&policy, &cells, Some(59.99)).keep);
        assert!(!apply_policy(&policy, &cells, None).keep);
        assert_eq!(apply_policy(&policy, &cells, Some(80.0)).cells, cells);
    }

    #[test]
    fn test_pass_through_policies() {
        let cells = four_cells([Some(1), Some(2), None, Some(4)]);
        for policy in [FilterPolicy::Weighted, FilterPolicy::None] {
            let d = apply_policy(&policy, &cells, None);
            assert!(d.keep);
            assert_eq!(d.cells, cells);
            assert!(!policy.computes_rating());
        }
    }
}
