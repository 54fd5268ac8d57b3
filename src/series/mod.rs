//! # Series: ingestion, storage, and batch scoring
//!
//! Facilities to **ingest**, **store**, and **score** photometric observations grouped by
//! object. The central type is [`SeriesSet`], a fast hash map that buckets time-ordered
//! observations per [`ObjectNumber`](crate::constants::ObjectNumber).
//!
//! Modules
//! -----------------
//! * [`batch`](crate::series::batch) – Zero-copy column container for in-memory ingestion.
//! * [`csv_reader`](crate::series::csv_reader) – Delimited-text ingestion with a header row.
//! * [`parquet_reader`](crate::series::parquet_reader) – Arrow/Parquet ingestion with column projection.
//! * [`series_file`](crate::series::series_file) – **Public** trait exposing `new_from_*` and
//!   `add_from_*` helpers to construct/extend a [`SeriesSet`] from the above sources.
//! * [`series_scoring`](crate::series::series_scoring) – Scoring over a whole set
//!   (`SeriesScoring` trait, cancellation, set statistics).
//! * *(crate-private)* `progress_bar` – Optional progress UI when the `progress` feature is enabled.
//!
//! Expected columns
//! -----------------
//! * `ssnamenr` – object designation (number or string),
//! * `jd` – epoch as a Julian date,
//! * `night` – integer night key,
//! * `id` – source record identifier,
//! * `fid` – image filter identifier,
//! * one column per requested [`Attribute`](crate::observations::Attribute), named after
//!   [`Attribute::name`](crate::observations::Attribute::name).
//!
//! Ordering
//! -----------------
//! Every `add_*` method re-sorts the touched series by epoch (stable). No deduplication
//! is performed: ingesting the same source twice duplicates its observations.
//!
//! A source is parsed completely into a staging set before anything is merged, so a
//! failed `add_*` call leaves the destination set unchanged.
use crate::constants::SeriesSet;
use crate::observations::series_ext::SeriesExt;

pub mod batch;
pub mod csv_reader;
pub mod parquet_reader;
#[cfg(feature = "progress")]
pub(crate) mod progress_bar;
pub mod series_file;
pub mod series_scoring;

/// Move the series of `staged` into `set`, then re-sort every series that grew.
pub(crate) fn merge_staged(set: &mut SeriesSet, staged: SeriesSet) {
    for (object, series) in staged {
        let target = set.entry(object).or_default();
        target.extend(series);
        target.sort_by_epoch();
    }
}
