//! # In-memory observation batches
//!
//! [`SeriesBatch`] is a column-oriented, possibly borrowed, view over observations of
//! many objects. It is expanded into concrete [`Observation`]s and grouped by object with
//! [`SeriesFile::new_from_batch`](crate::series::series_file::SeriesFile::new_from_batch)
//! or [`SeriesFile::add_from_batch`](crate::series::series_file::SeriesFile::add_from_batch).
//!
//! All columns must have the same length; [`SeriesBatch::validate`] enforces it before
//! anything is ingested.
//!
//! ## Example
//! -----------------
//! ```rust
//! use snaps::observations::Attribute;
//! use snaps::series::batch::SeriesBatch;
//! use snaps::ObjectNumber;
//!
//! let objects = vec![ObjectNumber::Int(1), ObjectNumber::Int(1)];
//! let jd = [2460000.5, 2460001.5];
//! let night = [1, 2];
//! let ids = vec!["a".to_string(), "b".to_string()];
//! let fid = [1, 2];
//! let elong = [1.1, 1.4];
//!
//! let batch = SeriesBatch::new(&objects, &jd, &night, &ids, &fid)
//!     .with_attribute(Attribute::Elong, &elong);
//! assert_eq!(batch.len(), 2);
//! assert!(batch.validate().is_ok());
//! ```
use std::borrow::Cow;
use std::collections::HashSet;

use ahash::RandomState;
use smallvec::SmallVec;

use crate::constants::{FilterId, JulianDate, NightKey, ObjectNumber, SeriesSet};
use crate::observations::{Attribute, Observation};
use crate::snaps_errors::SnapsError;

/// Column container for in-memory ingestion.
#[derive(Debug, Clone)]
pub struct SeriesBatch<'a> {
    pub objects: Cow<'a, [ObjectNumber]>,
    pub jd: Cow<'a, [JulianDate]>,
    pub night: Cow<'a, [NightKey]>,
    pub source_id: Cow<'a, [String]>,
    pub fid: Cow<'a, [FilterId]>,
    pub values: Vec<(Attribute, Cow<'a, [f64]>)>,
}

impl<'a> SeriesBatch<'a> {
    /// Borrow the identity columns.
    pub fn new(
        objects: &'a [ObjectNumber],
        jd: &'a [JulianDate],
        night: &'a [NightKey],
        source_id: &'a [String],
        fid: &'a [FilterId],
    ) -> Self {
        SeriesBatch {
            objects: Cow::Borrowed(objects),
            jd: Cow::Borrowed(jd),
            night: Cow::Borrowed(night),
            source_id: Cow::Borrowed(source_id),
            fid: Cow::Borrowed(fid),
            values: Vec::new(),
        }
    }

    /// Take ownership of the identity columns.
    pub fn from_owned(
        objects: Vec<ObjectNumber>,
        jd: Vec<JulianDate>,
        night: Vec<NightKey>,
        source_id: Vec<String>,
        fid: Vec<FilterId>,
    ) -> SeriesBatch<'static> {
        SeriesBatch {
            objects: Cow::Owned(objects),
            jd: Cow::Owned(jd),
            night: Cow::Owned(night),
            source_id: Cow::Owned(source_id),
            fid: Cow::Owned(fid),
            values: Vec::new(),
        }
    }

    /// Attach a borrowed attribute column.
    pub fn with_attribute(mut self, attribute: Attribute, values: &'a [f64]) -> Self {
        self.values.push((attribute, Cow::Borrowed(values)));
        self
    }

    /// Attach an owned attribute column.
    pub fn with_attribute_owned(mut self, attribute: Attribute, values: Vec<f64>) -> Self {
        self.values.push((attribute, Cow::Owned(values)));
        self
    }

    /// Number of rows (length of the object column).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Check column lengths and attribute uniqueness.
    ///
    /// Return
    /// ----------
    /// * `Err(SnapsError::SchemaError)` naming the first offending column.
    pub fn validate(&self) -> Result<(), SnapsError> {
        let n = self.len();
        let identity = [
            ("jd", self.jd.len()),
            ("night", self.night.len()),
            ("id", self.source_id.len()),
            ("fid", self.fid.len()),
        ];
        for (name, len) in identity {
            if len != n {
                return Err(SnapsError::SchemaError(format!(
                    "column '{name}' has {len} rows, expected {n}"
                )));
            }
        }

        let mut seen: HashSet<&Attribute, RandomState> = HashSet::default();
        for (attr, values) in &self.values {
            if values.len() != n {
                return Err(SnapsError::SchemaError(format!(
                    "column '{attr}' has {} rows, expected {n}",
                    values.len()
                )));
            }
            if !seen.insert(attr) {
                return Err(SnapsError::SchemaError(format!(
                    "column '{attr}' is given more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Expand `batch` into observations, group them by object and merge them into `set`.
pub(crate) fn series_from_batch(
    set: &mut SeriesSet,
    batch: &SeriesBatch<'_>,
) -> Result<usize, SnapsError> {
    batch.validate()?;

    let mut staged = SeriesSet::default();
    for i in 0..batch.len() {
        let mut obs = Observation::new(
            batch.jd[i],
            batch.night[i],
            batch.source_id[i].as_str(),
            batch.fid[i],
        );
        for (attr, values) in &batch.values {
            obs.set_value(attr.clone(), values[i]);
        }

        staged
            .entry(batch.objects[i].clone())
            .or_insert_with(|| SmallVec::with_capacity(32))
            .push(obs);
    }

    super::merge_staged(set, staged);
    Ok(batch.len())
}
