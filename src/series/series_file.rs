//! # Series ingestion
//!
//! The [`SeriesFile`] trait, implemented for [`SeriesSet`], builds and extends sets from
//! every supported source:
//!
//! | Source | Create | Extend |
//! |---|---|---|
//! | CSV file | [`SeriesFile::new_from_csv`] | [`SeriesFile::add_from_csv`] |
//! | Delimited stream | – | [`SeriesFile::add_from_reader`] |
//! | Parquet file | [`SeriesFile::new_from_parquet`] | [`SeriesFile::add_from_parquet`] |
//! | In-memory batch | [`SeriesFile::new_from_batch`] | [`SeriesFile::add_from_batch`] |
//!
//! Every method propagates I/O, schema and value errors as [`SnapsError`], and returns
//! or records the number of observations read. Touched series are re-sorted by epoch.
//!
//! ## Example
//! -----------------
//! ```no_run
//! use camino::Utf8Path;
//! use snaps::observations::Attribute;
//! use snaps::series::series_file::SeriesFile;
//! use snaps::SeriesSet;
//!
//! # fn demo() -> Result<(), snaps::SnapsError> {
//! let attrs = Attribute::defaults();
//! let mut set = SeriesSet::new_from_parquet(Utf8Path::new("alerts.parquet"), &attrs, None)?;
//! set.add_from_csv(Utf8Path::new("late_alerts.csv"), &attrs)?;
//! # Ok(()) }
//! ```
use std::collections::HashMap;
use std::io;

use camino::Utf8Path;

use super::batch::{series_from_batch, SeriesBatch};
use super::csv_reader::{csv_file_to_series_set, csv_to_series_set};
use super::parquet_reader::parquet_to_series_set;
use crate::constants::SeriesSet;
use crate::observations::Attribute;
use crate::snaps_errors::SnapsError;

pub trait SeriesFile {
    /// Create a set from a comma-separated file with a header row.
    fn new_from_csv(path: &Utf8Path, attributes: &[Attribute]) -> Result<Self, SnapsError>
    where
        Self: Sized;

    /// Append a comma-separated file; returns the number of observations read.
    fn add_from_csv(&mut self, path: &Utf8Path, attributes: &[Attribute])
        -> Result<usize, SnapsError>;

    /// Append delimited records from any reader (e.g. a tab-separated stream).
    fn add_from_reader<R: io::Read>(
        &mut self,
        reader: R,
        attributes: &[Attribute],
        delimiter: u8,
    ) -> Result<usize, SnapsError>;

    /// Create a set from a Parquet file.
    ///
    /// Arguments
    /// -----------------
    /// * `parquet` – path of the file.
    /// * `attributes` – attribute columns to read.
    /// * `batch_size` – optional Arrow reader batch size.
    fn new_from_parquet(
        parquet: &Utf8Path,
        attributes: &[Attribute],
        batch_size: Option<usize>,
    ) -> Result<Self, SnapsError>
    where
        Self: Sized;

    fn add_from_parquet(
        &mut self,
        parquet: &Utf8Path,
        attributes: &[Attribute],
        batch_size: Option<usize>,
    ) -> Result<usize, SnapsError>;

    fn new_from_batch(batch: &SeriesBatch<'_>) -> Result<Self, SnapsError>
    where
        Self: Sized;

    fn add_from_batch(&mut self, batch: &SeriesBatch<'_>) -> Result<usize, SnapsError>;
}

impl SeriesFile for SeriesSet {
    fn new_from_csv(path: &Utf8Path, attributes: &[Attribute]) -> Result<Self, SnapsError> {
        let mut set: SeriesSet = HashMap::default();
        csv_file_to_series_set(&mut set, path, attributes, b',')?;
        Ok(set)
    }

    fn add_from_csv(
        &mut self,
        path: &Utf8Path,
        attributes: &[Attribute],
    ) -> Result<usize, SnapsError> {
        csv_file_to_series_set(self, path, attributes, b',')
    }

    fn add_from_reader<R: io::Read>(
        &mut self,
        reader: R,
        attributes: &[Attribute],
        delimiter: u8,
    ) -> Result<usize, SnapsError> {
        csv_to_series_set(self, reader, attributes, delimiter)
    }

    fn new_from_parquet(
        parquet: &Utf8Path,
        attributes: &[Attribute],
        batch_size: Option<usize>,
    ) -> Result<Self, SnapsError> {
        let mut set: SeriesSet = HashMap::default();
        parquet_to_series_set(&mut set, parquet, attributes, batch_size)?;
        Ok(set)
    }

    fn add_from_parquet(
        &mut self,
        parquet: &Utf8Path,
        attributes: &[Attribute],
        batch_size: Option<usize>,
    ) -> Result<usize, SnapsError> {
        parquet_to_series_set(self, parquet, attributes, batch_size)
    }

    fn new_from_batch(batch: &SeriesBatch<'_>) -> Result<Self, SnapsError> {
        let mut set: SeriesSet = HashMap::default();
        series_from_batch(&mut set, batch)?;
        Ok(set)
    }

    fn add_from_batch(&mut self, batch: &SeriesBatch<'_>) -> Result<usize, SnapsError> {
        series_from_batch(self, batch)
    }
}
