//! # Ranked table of sigma rows
//!
//! A [`RankedTable`] holds the surviving rows of a run in processing order, together with
//! the attribute list that fixes the column layout:
//!
//! ```text
//! Name | <attr> | ZTF-<ATTR> | ... | Row Sum | Abs Row Sum | Rating
//! ```
//!
//! Rows are looked up by object identifier; column summaries (sum and mean) are computed
//! on demand. Tables are only created through [`TableBuilder`](super::builder::TableBuilder)
//! and never mutated in place: filtering and sorting return new tables.
use std::fmt;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Row, Table};

use super::column::{Column, COL_ABS_ROW_SUM, COL_NAME, COL_RATING, COL_ROW_SUM};
use super::row::SigmaRow;
use crate::constants::ObjectNumber;
use crate::observations::Attribute;

/// Sum and mean of one numeric column, over the rows that carry a value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnSummary {
    pub count: usize,
    pub sum: f64,
}

impl ColumnSummary {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// One denormalised table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCell {
    Text(String),
    Number(f64),
    Missing,
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableCell::Text(s) => f.write_str(s),
            TableCell::Number(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            TableCell::Missing => f.write_str(""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedTable {
    attributes: Vec<Attribute>,
    rows: Vec<SigmaRow>,
}

impl RankedTable {
    /// Rows must already be validated against `attributes`.
    pub(crate) fn from_parts(attributes: Vec<Attribute>, rows: Vec<SigmaRow>) -> Self {
        RankedTable { attributes, rows }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn rows(&self) -> &[SigmaRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, object: &ObjectNumber) -> Option<&SigmaRow> {
        self.rows.iter().find(|r| r.object() == object)
    }

    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectNumber> {
        self.rows.iter().map(|r| r.object())
    }

    /// Values of `column` over the rows that carry one.
    pub fn column_values(&self, column: &Column) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.value(column)).collect()
    }

    pub fn summary(&self, column: &Column) -> ColumnSummary {
        self.rows
            .iter()
            .filter_map(|r| r.value(column))
            .fold(ColumnSummary::default(), |acc, v| ColumnSummary {
                count: acc.count + 1,
                sum: acc.sum + v,
            })
    }

    /// Corpus-level summary of every attribute column, in column order.
    pub fn attribute_summaries(&self) -> Vec<(Attribute, ColumnSummary)> {
        self.attributes
            .iter()
            .map(|a| (a.clone(), self.summary(&Column::Sigma(a.clone()))))
            .collect()
    }

    /// Rows satisfying `keep`, as a new table with the same layout.
    pub fn filtered<F>(&self, mut keep: F) -> RankedTable
    where
        F: FnMut(&SigmaRow) -> bool,
    {
        RankedTable {
            attributes: self.attributes.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// New table sorted by `column`; rows without a value go last.
    ///
    /// The sort is stable, so equal values keep processing order.
    pub fn sorted_by(&self, column: &Column, descending: bool) -> RankedTable {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| match (a.value(column), b.value(column)) {
            (Some(x), Some(y)) => {
                if descending {
                    y.total_cmp(&x)
                } else {
                    x.total_cmp(&y)
                }
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        RankedTable {
            attributes: self.attributes.clone(),
            rows,
        }
    }

    /// Most anomalous first: descending absolute row sum.
    pub fn ranked(&self) -> RankedTable {
        self.sorted_by(&Column::AbsRowSum, true)
    }

    /// Column headers in output order.
    pub fn header(&self) -> Vec<String> {
        let mut h = Vec::with_capacity(4 + 2 * self.attributes.len());
        h.push(COL_NAME.to_string());
        for a in &self.attributes {
            h.push(a.name().to_string());
            h.push(a.source_column());
        }
        h.push(COL_ROW_SUM.to_string());
        h.push(COL_ABS_ROW_SUM.to_string());
        h.push(COL_RATING.to_string());
        h
    }

    /// Denormalised records aligned with [`RankedTable::header`].
    pub fn records(&self) -> Vec<Vec<TableCell>> {
        self.rows
            .iter()
            .map(|row| {
                let mut rec = Vec::with_capacity(4 + 2 * self.attributes.len());
                rec.push(TableCell::Text(row.object().to_string()));
                for a in &self.attributes {
                    match row.cell(a) {
                        Some(c) => {
                            rec.push(TableCell::Number(c.sigma));
                            rec.push(
                                c.source_id()
                                    .map(|s| TableCell::Text(s.to_string()))
                                    .unwrap_or(TableCell::Missing),
                            );
                        }
                        None => {
                            rec.push(TableCell::Missing);
                            rec.push(TableCell::Missing);
                        }
                    }
                }
                rec.push(TableCell::Number(row.row_sum()));
                rec.push(TableCell::Number(row.abs_row_sum()));
                rec.push(
                    row.rating()
                        .map(TableCell::Number)
                        .unwrap_or(TableCell::Missing),
                );
                rec
            })
            .collect()
    }

    fn render_comfy(&self, with_summary: bool) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(self.header().into_iter().map(Cell::new).collect::<Vec<_>>());

        for rec in self.records() {
            table.add_row(Row::from(
                rec.iter()
                    .map(|c| match c {
                        TableCell::Number(_) => {
                            Cell::new(format!("{c:.4}")).set_alignment(CellAlignment::Right)
                        }
                        _ => Cell::new(c.to_string()),
                    })
                    .collect::<Vec<_>>(),
            ));
        }

        if with_summary {
            let sums = self.attribute_summaries();
            for (label, pick) in [("Sum", false), ("Mean", true)] {
                let mut cells = vec![Cell::new(label)];
                for (_, s) in &sums {
                    let v = if pick { s.mean() } else { Some(s.sum) };
                    cells.push(
                        Cell::new(v.map(|v| format!("{v:.4}")).unwrap_or_default())
                            .set_alignment(CellAlignment::Right),
                    );
                    cells.push(Cell::new(""));
                }
                table.add_row(Row::from(cells));
            }
        }

        table.to_string()
    }
}

impl fmt::Display for RankedTable {
    /// Plain table by default; `{:#}` appends per-attribute sum and mean rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ranked table (rows={})", self.len())?;
        f.write_str(&self.render_comfy(f.alternate()))
    }
}

#[cfg(test)]
mod ranked_table_tests {
    use super::*;
    use crate::observations::GroupKey;
    use crate::scoring::aggregate::RowSums;
    use crate::table::row::{SigmaCell, Trigger};

    fn row(id: u32, elong: f64, rb: f64, rating: Option<f64>) -> SigmaRow {
        let cells = vec![
            SigmaCell {
                attribute: Attribute::Elong,
                sigma: elong,
                trigger: Some(Trigger {
                    source_id: format!("e{id}"),
                    key: GroupKey::Night(1),
                }),
            },
            SigmaCell {
                attribute: Attribute::RealBogus,
                sigma: rb,
                trigger: None,
            },
        ];
        let sums = RowSums::from_sigmas([elong, rb]);
        SigmaRow::new(ObjectNumber::Int(id), cells, sums, rating)
    }

    fn table() -> RankedTable {
        RankedTable::from_parts(
            vec![Attribute::Elong, Attribute::RealBogus],
            vec![
                row(1, 1.0, -0.5, Some(40.0)),
                row(2, 3.0, 1.0, None),
                row(3, -2.0, 0.0, Some(90.0)),
            ],
        )
    }

    #[test]
    fn header_layout() {
        assert_eq!(
            table().header(),
            vec![
                "Name",
                "elong",
                "ZTF-ELONG",
                "rb",
                "ZTF-RB",
                "Row Sum",
                "Abs Row Sum",
                "Rating"
            ]
        );
    }

    #[test]
    fn records_denormalise_cells() {
        let recs = table().records();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0][0], TableCell::Text("1".into()));
        assert_eq!(recs[0][1], TableCell::Number(1.0));
        assert_eq!(recs[0][2], TableCell::Text("e1".into()));
        assert_eq!(recs[0][4], TableCell::Missing);
        assert_eq!(recs[1][7], TableCell::Missing);
        assert_eq!(recs[2][7], TableCell::Number(90.0));
    }

    #[test]
    fn summaries_over_present_values() {
        let t = table();
        let s = t.summary(&Column::Sigma(Attribute::Elong));
        assert_eq!(s.count, 3);
        assert!((s.sum - 2.0).abs() < 1e-12);
        assert!((s.mean().unwrap() - 2.0 / 3.0).abs() < 1e-12);

        let r = t.summary(&Column::Rating);
        assert_eq!(r.count, 2);
        assert_eq!(r.mean(), Some(65.0));
        assert_eq!(RankedTable::default().summary(&Column::RowSum).mean(), None);
        assert_eq!(t.attribute_summaries().len(), 2);
    }

    #[test]
    fn ranking_and_sorting() {
        let t = table();
        let ranked: Vec<_> = t.ranked().object_ids().cloned().collect();
        assert_eq!(
            ranked,
            vec![ObjectNumber::Int(2), ObjectNumber::Int(3), ObjectNumber::Int(1)]
        );

        let by_rating: Vec<_> = t
            .sorted_by(&Column::Rating, false)
            .object_ids()
            .cloned()
            .collect();
        assert_eq!(
            by_rating,
            vec![ObjectNumber::Int(1), ObjectNumber::Int(3), ObjectNumber::Int(2)]
        );
    }

    #[test]
    fn display_with_summary() {
        let t = table();
        let plain = format!("{t}");
        let pretty = format!("{t:#}");
        assert!(plain.contains("Abs Row Sum"));
        assert!(plain.contains("3.0000"));
        assert!(!plain.contains("Mean"));
        assert!(pretty.contains("Mean"));
        assert!(pretty.contains("Sum"));
    }
}
