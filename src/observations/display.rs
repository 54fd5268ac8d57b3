//! # Tabular display for photometric observation series
//!
//! Pretty, zero-copy renderers to print an object series as a **table**.
//!
//! ## Overview
//!
//! The main entry point is the display adaptor [`SeriesDisplay`]. It **borrows** the
//! observations and renders a formatted table when used with Rust formatting (`{}`),
//! without cloning or moving data.
//!
//! Two layouts are available:
//!
//! - **Default** (compact, fixed-width):
//!   `# | JD | night | fid | id | <attributes...>`
//! - **ISO** (uses `comfy-table`):
//!   replaces the Julian date with `ISO (UTC)` rendered through `hifitime`.
//!
//! ## Sorting
//!
//! `sorted()` prints rows **sorted by epoch**; the first column `#` always shows the
//! **original index** (pre-sort) for traceability.
//!
//! ## Quick examples
//!
//! ```rust,ignore
//! use snaps::observations::display::SeriesDisplayExt;
//!
//! println!("{}", series.show().sorted());
//! println!("{}", series.table_iso().with_precision(2));
//! ```
use std::fmt;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Row, Table};
use hifitime::{Epoch, TimeScale};

use super::{Attribute, Observation};
use crate::constants::JDTOMJD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableMode {
    Default,
    Iso,
}

/// Display adaptor over a borrowed slice of observations.
///
/// The attribute columns are the union of the attributes carried by the observations,
/// in first-seen order. A missing value renders as `-`.
pub struct SeriesDisplay<'a> {
    obs: &'a [Observation],
    mode: TableMode,
    /// Fractional digits for attribute values (default = 4).
    prec: usize,
    sorted: bool,
}

impl<'a> SeriesDisplay<'a> {
    pub fn new(obs: &'a [Observation]) -> Self {
        Self {
            obs,
            mode: TableMode::Default,
            prec: 4,
            sorted: false,
        }
    }

    /// Switch to the ISO layout.
    pub fn iso(mut self) -> Self {
        self.mode = TableMode::Iso;
        self
    }

    /// Number of fractional digits used for attribute values.
    pub fn with_precision(mut self, p: usize) -> Self {
        self.prec = p;
        self
    }

    /// Print rows sorted by epoch; `#` keeps the original index.
    pub fn sorted(mut self) -> Self {
        self.sorted = true;
        self
    }

    fn columns(&self) -> Vec<&'a Attribute> {
        let mut cols: Vec<&Attribute> = Vec::new();
        for attr in self.obs.iter().flat_map(|o| o.attributes()) {
            if !cols.contains(&attr) {
                cols.push(attr);
            }
        }
        cols
    }

    /// Iterator over `(index_before_sort, &Observation)`.
    fn row_iter(&self) -> Box<dyn Iterator<Item = (usize, &'a Observation)> + '_> {
        if self.sorted {
            let mut order: Vec<usize> = (0..self.obs.len()).collect();
            order.sort_by(|&a, &b| {
                self.obs[a]
                    .jd
                    .total_cmp(&self.obs[b].jd)
                    .then_with(|| a.cmp(&b))
            });
            Box::new(order.into_iter().map(|i| (i, &self.obs[i])))
        } else {
            Box::new(self.obs.iter().enumerate())
        }
    }

    fn fmt_value(&self, o: &Observation, attr: &Attribute) -> String {
        match o.value(attr) {
            Some(v) => format!("{:.*}", self.prec, v),
            None => "-".to_string(),
        }
    }

    fn render_iso_comfy(&self, cols: &[&Attribute]) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let mut header = vec![
            Cell::new("#"),
            Cell::new("ISO (UTC)"),
            Cell::new("night"),
            Cell::new("fid"),
            Cell::new("id"),
        ];
        header.extend(cols.iter().map(|a| Cell::new(a.name())));
        table.set_header(header);

        for (i, o) in self.row_iter() {
            let iso = Epoch::from_mjd_in_time_scale(o.jd - JDTOMJD, TimeScale::UTC).to_string();
            let mut cells = vec![
                Cell::new(i).set_alignment(CellAlignment::Right),
                Cell::new(iso).set_alignment(CellAlignment::Right),
                Cell::new(o.night).set_alignment(CellAlignment::Right),
                Cell::new(o.fid).set_alignment(CellAlignment::Right),
                Cell::new(&o.source_id),
            ];
            cells.extend(
                cols.iter()
                    .map(|a| Cell::new(self.fmt_value(o, a)).set_alignment(CellAlignment::Right)),
            );
            table.add_row(Row::from(cells));
        }

        table.to_string()
    }

    fn write_compact(&self, f: &mut fmt::Formatter<'_>, cols: &[&Attribute]) -> fmt::Result {
        write!(f, "{:>3}  {:>16}  {:>6}  {:>3}  {:>20}", "#", "JD", "night", "fid", "id")?;
        for a in cols {
            write!(f, "  {:>12}", a.name())?;
        }
        writeln!(f)?;
        for (i, o) in self.row_iter() {
            write!(
                f,
                "{i:>3}  {jd:>16.6}  {night:>6}  {fid:>3}  {id:>20}",
                jd = o.jd,
                night = o.night,
                fid = o.fid,
                id = o.source_id
            )?;
            for a in cols {
                write!(f, "  {:>12}", self.fmt_value(o, a))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Ergonomic constructors for [`SeriesDisplay`].
pub trait SeriesDisplayExt {
    /// Compact fixed-width table.
    fn show(&self) -> SeriesDisplay<'_>;

    /// ISO timestamp table.
    fn table_iso(&self) -> SeriesDisplay<'_>;

    fn show_string(&self) -> String {
        format!("{}", self.show())
    }
}

impl SeriesDisplayExt for [Observation] {
    fn show(&self) -> SeriesDisplay<'_> {
        SeriesDisplay::new(self)
    }

    fn table_iso(&self) -> SeriesDisplay<'_> {
        SeriesDisplay::new(self).iso()
    }
}

impl fmt::Display for SeriesDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.obs.len();
        writeln!(f, "Observations (n={n})")?;
        writeln!(f, "-------------------")?;

        let cols = self.columns();
        match self.mode {
            TableMode::Iso => f.write_str(&self.render_iso_comfy(&cols)),
            TableMode::Default => self.write_compact(f, &cols),
        }
    }
}

#[cfg(test)]
mod series_display_tests {
    use super::*;
    use crate::constants::ObjectSeries;

    fn sample_series() -> ObjectSeries {
        let mut series = ObjectSeries::new();
        series.push(
            Observation::new(2451546.0, 2, "later", 1)
                .with_value(Attribute::Elong, 1.25)
                .with_value(Attribute::RealBogus, 0.5),
        );
        series.push(Observation::new(2451545.0, 1, "earlier", 2).with_value(Attribute::Elong, 3.0));
        series
    }

    #[test]
    fn default_headers_and_missing_values() {
        let series = sample_series();
        let s = format!("{}", series.show());

        assert!(s.starts_with("Observations (n=2)"));
        assert!(s.contains("elong"));
        assert!(s.contains("rb"));
        assert!(s.contains("1.2500"));
        // "earlier" has no rb value
        let earlier = s.lines().find(|l| l.contains("earlier")).unwrap();
        assert!(earlier.trim_end().ends_with('-'));
    }

    #[test]
    fn sorted_orders_by_time_and_keeps_original_index() {
        let series = sample_series();
        let s = format!("{}", series.show().sorted());

        let first_row = s.lines().nth(3).unwrap();
        assert!(first_row.trim_start().starts_with('1'));
        assert!(first_row.contains("earlier"));
    }

    #[test]
    fn iso_mode_uses_calendar_dates() {
        let series = sample_series();
        let s = format!("{}", series.table_iso().with_precision(1));

        assert!(s.contains("ISO (UTC)"));
        assert!(s.contains("2000-01-0"));
        assert!(s.contains("3.0"));
    }

    #[test]
    fn show_string_matches_display_default() {
        let series = sample_series();
        assert_eq!(series.show_string(), format!("{}", series.show()));
    }
}
