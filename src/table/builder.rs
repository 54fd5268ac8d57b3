//! Single construction path for [`RankedTable`]s.
//!
//! The same builder serves one-object inspections and whole-corpus runs: it validates
//! that every row carries exactly the configured attributes, in order, and that object
//! identifiers are unique.
use ahash::RandomState;
use std::collections::HashSet;

use super::ranked_table::RankedTable;
use super::row::SigmaRow;
use crate::observations::Attribute;
use crate::snaps_errors::SnapsError;

#[derive(Debug, Clone, PartialEq)]
pub struct TableBuilder {
    attributes: Vec<Attribute>,
}

impl TableBuilder {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        TableBuilder { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Build a table from rows in processing order.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::InvalidParameter)` – a row's cells do not match the attribute
    ///   layout, or an object appears twice.
    pub fn build<I>(&self, rows: I) -> Result<RankedTable, SnapsError>
    where
        I: IntoIterator<Item = SigmaRow>,
    {
        let mut seen: HashSet<_, RandomState> = HashSet::default();
        let mut out = Vec::new();

        for row in rows {
            let layout_ok = row.cells().len() == self.attributes.len()
                && row
                    .cells()
                    .iter()
                    .zip(&self.attributes)
                    .all(|(c, a)| &c.attribute == a);
            if !layout_ok {
                return Err(SnapsError::InvalidParameter(format!(
                    "row for object {} does not match the table attributes [{}]",
                    row.object(),
                    self.attributes
                        .iter()
                        .map(|a| a.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            if !seen.insert(row.object().clone()) {
                return Err(SnapsError::InvalidParameter(format!(
                    "object {} appears more than once",
                    row.object()
                )));
            }
            out.push(row);
        }

        Ok(RankedTable::from_parts(self.attributes.clone(), out))
    }
}
