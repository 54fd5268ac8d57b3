//! # CSV reader for observation series
//!
//! Reads delimited text with a header row into a [`SeriesSet`].
//!
//! ## Expected columns
//! -----------------
//! `ssnamenr`, `jd`, `night`, `id`, `fid` and one column per requested attribute, in any
//! order; extra columns are ignored. Header names are matched exactly, except attribute
//! columns which go through [`Attribute::name`].
//!
//! ## Null handling
//! -----------------
//! * An empty attribute cell leaves the value unset on the observation; scoring skips it
//!   for that attribute.
//! * An empty identity cell (`ssnamenr`, `jd`, `night`, `id`, `fid`) is an
//!   [`SnapsError::InvalidValue`].
//! * `night` accepts integral floats (`"12.0"`), as written by dataframe exports.
use std::io;

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord};
use smallvec::SmallVec;
use tracing::debug;

use crate::constants::{
    FilterId, NightKey, ObjectNumber, SeriesSet, COL_FID, COL_JD, COL_NIGHT, COL_OBJECT,
    COL_SOURCE_ID,
};
use crate::observations::{Attribute, Observation};
use crate::snaps_errors::SnapsError;

/// Resolved column positions of one header.
struct Layout {
    object: usize,
    jd: usize,
    night: usize,
    source_id: usize,
    fid: usize,
    attributes: Vec<(Attribute, usize)>,
}

impl Layout {
    fn from_header(header: &StringRecord, attributes: &[Attribute]) -> Result<Self, SnapsError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SnapsError::SchemaError(format!("column '{name}' not found in header")))
        };

        Ok(Layout {
            object: find(COL_OBJECT)?,
            jd: find(COL_JD)?,
            night: find(COL_NIGHT)?,
            source_id: find(COL_SOURCE_ID)?,
            fid: find(COL_FID)?,
            attributes: attributes
                .iter()
                .map(|a| Ok((a.clone(), find(a.name())?)))
                .collect::<Result<_, SnapsError>>()?,
        })
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize, column: &str) -> Result<&'r str, SnapsError> {
    match record.get(idx).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(SnapsError::InvalidValue {
            column: column.to_string(),
            value: String::new(),
        }),
    }
}

fn invalid(column: &str, value: &str) -> SnapsError {
    SnapsError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_night(s: &str) -> Result<NightKey, SnapsError> {
    s.parse::<NightKey>().or_else(|_| {
        let x: f64 = s.parse().map_err(|_| invalid(COL_NIGHT, s))?;
        if x.is_finite() && x.fract() == 0.0 {
            Ok(x as NightKey)
        } else {
            Err(invalid(COL_NIGHT, s))
        }
    })
}

fn parse_record(record: &StringRecord, layout: &Layout) -> Result<(ObjectNumber, Observation), SnapsError> {
    let object_s = field(record, layout.object, COL_OBJECT)?;
    let object: ObjectNumber = object_s.parse().map_err(|_| invalid(COL_OBJECT, object_s))?;

    let jd_s = field(record, layout.jd, COL_JD)?;
    let jd: f64 = jd_s.parse().map_err(|_| invalid(COL_JD, jd_s))?;
    let night = parse_night(field(record, layout.night, COL_NIGHT)?)?;
    let source_id = field(record, layout.source_id, COL_SOURCE_ID)?;
    let fid_s = field(record, layout.fid, COL_FID)?;
    let fid: FilterId = fid_s.parse().map_err(|_| invalid(COL_FID, fid_s))?;

    let mut obs = Observation::new(jd, night, source_id, fid);
    for (attr, idx) in &layout.attributes {
        let Some(s) = record.get(*idx).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let v: f64 = s.parse().map_err(|_| invalid(attr.name(), s))?;
        obs.set_value(attr.clone(), v);
    }
    Ok((object, obs))
}

/// Read CSV records from `reader` into `set`.
///
/// Arguments
/// -----------------
/// * `set` – destination set; observations are appended once every record has parsed.
/// * `reader` – any byte source with a header row.
/// * `attributes` – attribute columns to read.
/// * `delimiter` – field delimiter (`b','` for CSV).
///
/// Return
/// ----------
/// * The number of observations read.
pub(crate) fn csv_to_series_set<R: io::Read>(
    set: &mut SeriesSet,
    reader: R,
    attributes: &[Attribute],
    delimiter: u8,
) -> Result<usize, SnapsError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let layout = Layout::from_header(rdr.headers()?, attributes)?;

    let mut staged = SeriesSet::default();
    let mut n = 0;
    for record in rdr.records() {
        let record = record?;
        let (object, obs) = parse_record(&record, &layout)?;
        staged
            .entry(object)
            .or_insert_with(|| SmallVec::with_capacity(32))
            .push(obs);
        n += 1;
    }

    debug!(rows = n, objects = staged.len(), "csv series ingested");
    super::merge_staged(set, staged);
    Ok(n)
}

/// File variant of [`csv_to_series_set`].
pub(crate) fn csv_file_to_series_set(
    set: &mut SeriesSet,
    path: &Utf8Path,
    attributes: &[Attribute],
    delimiter: u8,
) -> Result<usize, SnapsError> {
    let file = std::fs::File::open(path)?;
    csv_to_series_set(set, io::BufReader::new(file), attributes, delimiter)
}

#[cfg(test)]
mod csv_reader_tests {
    use super::*;

    const DATA: &str = "\
ssnamenr,jd,night,id,fid,elong,rb,extra
1465,2460002.5,2,c,1,1.3,0.9,x
1465,2460000.5,0,a,1,1.1,0.8,x
2015AB,2460001.5,1.0,b,2,1.2,,x
";

    #[test]
    fn test_reads_and_groups() {
        let mut set = SeriesSet::default();
        let attrs = [Attribute::Elong, Attribute::RealBogus];
        let n = csv_to_series_set(&mut set, DATA.as_bytes(), &attrs, b',').unwrap();
        assert_eq!(n, 3);
        assert_eq!(set.len(), 2);

        let numbered = &set[&ObjectNumber::Int(1465)];
        assert_eq!(numbered[0].source_id, "a");
        assert_eq!(numbered[1].value(&Attribute::Elong), Some(1.3));

        let named = &set[&ObjectNumber::String("2015AB".into())];
        assert_eq!(named[0].night, 1);
        assert_eq!(named[0].fid, 2);
        assert_eq!(named[0].value(&Attribute::RealBogus), None);
    }

    #[test]
    fn test_missing_column() {
        let mut set = SeriesSet::default();
        let err = csv_to_series_set(&mut set, DATA.as_bytes(), &[Attribute::AbsMagnitude], b',');
        assert!(matches!(err, Err(SnapsError::SchemaError(_))));
    }

    #[test]
    fn test_invalid_values() {
        let data = "ssnamenr,jd,night,id,fid,elong\n1,abc,0,a,1,1.0\n";
        let mut set = SeriesSet::default();
        let err = csv_to_series_set(&mut set, data.as_bytes(), &[Attribute::Elong], b',');
        assert_eq!(
            err,
            Err(SnapsError::InvalidValue {
                column: "jd".into(),
                value: "abc".into()
            })
        );

        let data = "ssnamenr,jd,night,id,fid,elong\n1,2460000.5,0.5,a,1,1.0\n";
        assert!(csv_to_series_set(&mut set, data.as_bytes(), &[Attribute::Elong], b',').is_err());
    }
}
