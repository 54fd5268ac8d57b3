#![allow(dead_code)]

use snaps::observations::{Attribute, Observation};
use snaps::scoring::aggregate::RowSums;
use snaps::table::{SigmaCell, SigmaRow, TableBuilder};
use snaps::{ObjectNumber, ObjectSeries, RankedTable};

pub const JD0: f64 = 2460000.5;

/// Series with one value per attribute and per observation; night = index.
pub fn series_of(columns: &[(Attribute, &[f64])]) -> ObjectSeries {
    let n = columns.first().map_or(0, |(_, v)| v.len());
    (0..n)
        .map(|i| {
            columns.iter().fold(
                Observation::new(JD0 + i as f64, i as i64, format!("cand{i}"), 1),
                |obs, (attr, values)| obs.with_value(attr.clone(), values[i]),
            )
        })
        .collect()
}

/// Single-attribute elongation series.
pub fn elong_series(values: &[f64]) -> ObjectSeries {
    series_of(&[(Attribute::Elong, values)])
}

/// Four-attribute series with a clear spike at `spike_at`.
pub fn default_series(n: usize, spike_at: usize) -> ObjectSeries {
    (0..n)
        .map(|i| {
            let spike = i == spike_at;
            Observation::new(JD0 + i as f64, (i / 2) as i64, format!("cand{i}"), 1 + (i % 2) as u8)
                .with_value(Attribute::Elong, if spike { 4.0 } else { 1.1 + 0.05 * (i % 3) as f64 })
                .with_value(Attribute::RealBogus, if spike { 0.2 } else { 0.8 + 0.02 * (i % 4) as f64 })
                .with_value(Attribute::AbsMagnitude, 15.0 + 0.1 * (i % 5) as f64)
                .with_value(Attribute::Mag18oMag8, if spike { 3.0 } else { 0.5 + 0.1 * (i % 2) as f64 })
        })
        .collect()
}

/// Table of `sigmas.len()` rows with one `elong` column.
pub fn elong_table(sigmas: &[f64]) -> RankedTable {
    let rows = sigmas.iter().enumerate().map(|(i, s)| {
        SigmaRow::new(
            ObjectNumber::Int(i as u32 + 1),
            [SigmaCell {
                attribute: Attribute::Elong,
                sigma: *s,
                trigger: None,
            }],
            RowSums::from_sigmas([*s]),
            None,
        )
    });
    TableBuilder::new(vec![Attribute::Elong])
        .build(rows)
        .expect("valid table")
}
