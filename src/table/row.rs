//! Rows of the ranked table.
use smallvec::SmallVec;

use super::column::Column;
use crate::constants::{ObjectNumber, Rating, Sigma};
use crate::observations::{Attribute, GroupKey};
use crate::scoring::aggregate::RowSums;
use crate::scoring::sigma::AttributeSigma;

/// Observation that produced a stored sigma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub source_id: String,
    pub key: GroupKey,
}

/// One attribute's cell in a row.
///
/// A neutralised attribute (not enough data, no spread) has sigma `0` and no trigger.
/// A cell zeroed by the occurrence filter keeps its trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct SigmaCell {
    pub attribute: Attribute,
    pub sigma: Sigma,
    pub trigger: Option<Trigger>,
}

impl SigmaCell {
    pub fn neutral(attribute: Attribute) -> Self {
        SigmaCell {
            attribute,
            sigma: 0.0,
            trigger: None,
        }
    }

    pub fn zeroed(mut self) -> Self {
        self.sigma = 0.0;
        self
    }

    pub fn trigger_key(&self) -> Option<GroupKey> {
        self.trigger.as_ref().map(|t| t.key)
    }

    pub fn source_id(&self) -> Option<&str> {
        self.trigger.as_ref().map(|t| t.source_id.as_str())
    }
}

impl From<&AttributeSigma> for SigmaCell {
    fn from(s: &AttributeSigma) -> Self {
        SigmaCell {
            attribute: s.attribute.clone(),
            sigma: s.signed_sigma,
            trigger: Some(Trigger {
                source_id: s.trigger_source_id.clone(),
                key: s.trigger_key,
            }),
        }
    }
}

/// Immutable result row of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct SigmaRow {
    object: ObjectNumber,
    cells: SmallVec<[SigmaCell; 4]>,
    sums: RowSums,
    rating: Option<Rating>,
}

impl SigmaRow {
    pub fn new<I>(object: ObjectNumber, cells: I, sums: RowSums, rating: Option<Rating>) -> Self
    where
        I: IntoIterator<Item = SigmaCell>,
    {
        SigmaRow {
            object,
            cells: cells.into_iter().collect(),
            sums,
            rating,
        }
    }

    pub fn object(&self) -> &ObjectNumber {
        &self.object
    }

    pub fn cells(&self) -> &[SigmaCell] {
        &self.cells
    }

    pub fn cell(&self, attribute: &Attribute) -> Option<&SigmaCell> {
        self.cells.iter().find(|c| &c.attribute == attribute)
    }

    pub fn sigma(&self, attribute: &Attribute) -> Option<Sigma> {
        self.cell(attribute).map(|c| c.sigma)
    }

    pub fn row_sum(&self) -> f64 {
        self.sums.row_sum
    }

    pub fn abs_row_sum(&self) -> f64 {
        self.sums.abs_row_sum
    }

    pub fn sums(&self) -> RowSums {
        self.sums
    }

    /// Rating, present only when the run's filter policy computes one.
    pub fn rating(&self) -> Option<Rating> {
        self.rating
    }

    /// Value of a numeric column; `None` when the row has no such value.
    pub fn value(&self, column: &Column) -> Option<f64> {
        match column {
            Column::Sigma(a) => self.sigma(a),
            Column::RowSum => Some(self.row_sum()),
            Column::AbsRowSum => Some(self.abs_row_sum()),
            Column::Rating => self.rating,
        }
    }
}
