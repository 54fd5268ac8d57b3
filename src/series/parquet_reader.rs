//! # Parquet reader for observation series
//!
//! Column-projected ingestion of survey exports stored as **Apache Parquet** into a
//! [`SeriesSet`].
//!
//! ## Overview
//! -----------------
//! * **Projection-first**: only the identity columns and the requested attribute columns
//!   are materialized.
//! * **Typed downcast once per batch**: each projected column is converted to a plain
//!   vector of options before the row loop.
//! * Rows are staged and merged only once the whole file has been read; series touched
//!   by the file are then re-sorted by epoch.
//!
//! ## Accepted column types
//! -----------------
//! * `ssnamenr`: `Int32`, `Int64`, `UInt32` (numbered objects) or `Utf8`/`LargeUtf8`
//!   (parsed with [`ObjectNumber::from_str`](std::str::FromStr)).
//! * `jd`: `Float64`.
//! * `night`, `fid`: any of `Int32`, `Int64`, `UInt32`, `UInt8`.
//! * `id`: `Utf8`, `LargeUtf8`, `Int64` or `UInt64`.
//! * attribute columns: `Float64` or `Float32`.
//!
//! ## Null handling policy
//! -----------------
//! * A null in an identity column drops the row (counted and logged at debug level).
//! * A null attribute leaves the value unset on the observation.
use arrow_array::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
    UInt32Array, UInt64Array, UInt8Array,
};
use arrow_array::RecordBatch;
use camino::Utf8Path;
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ProjectionMask};
use parquet::errors::ParquetError;
use smallvec::SmallVec;
use tracing::debug;

use crate::constants::{
    FilterId, ObjectNumber, SeriesSet, COL_FID, COL_JD, COL_NIGHT, COL_OBJECT, COL_SOURCE_ID,
    DEFAULT_PARQUET_BATCH,
};
use crate::observations::{Attribute, Observation};
use crate::snaps_errors::SnapsError;

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b dyn Array, SnapsError> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .ok_or_else(|| SnapsError::SchemaError(format!("column '{name}' missing from batch")))
}

fn wrong_type(name: &str, arr: &dyn Array) -> SnapsError {
    SnapsError::SchemaError(format!(
        "column '{name}' has unsupported type {}",
        arr.data_type()
    ))
}

macro_rules! collect_as {
    ($arr:expr, $ty:ty, $conv:expr) => {
        $arr.as_any().downcast_ref::<$ty>().map(|a| {
            (0..a.len())
                .map(|i| if a.is_null(i) { None } else { Some($conv(a.value(i))) })
                .collect::<Vec<_>>()
        })
    };
}

fn f64_values(name: &str, arr: &dyn Array) -> Result<Vec<Option<f64>>, SnapsError> {
    collect_as!(arr, Float64Array, |v: f64| v)
        .or_else(|| collect_as!(arr, Float32Array, |v: f32| v as f64))
        .ok_or_else(|| wrong_type(name, arr))
}

fn i64_values(name: &str, arr: &dyn Array) -> Result<Vec<Option<i64>>, SnapsError> {
    collect_as!(arr, Int64Array, |v: i64| v)
        .or_else(|| collect_as!(arr, Int32Array, |v: i32| v as i64))
        .or_else(|| collect_as!(arr, UInt32Array, |v: u32| v as i64))
        .or_else(|| collect_as!(arr, UInt8Array, |v: u8| v as i64))
        .ok_or_else(|| wrong_type(name, arr))
}

fn string_values(name: &str, arr: &dyn Array) -> Result<Vec<Option<String>>, SnapsError> {
    collect_as!(arr, StringArray, |v: &str| v.to_string())
        .or_else(|| collect_as!(arr, LargeStringArray, |v: &str| v.to_string()))
        .or_else(|| collect_as!(arr, Int64Array, |v: i64| v.to_string()))
        .or_else(|| collect_as!(arr, UInt64Array, |v: u64| v.to_string()))
        .ok_or_else(|| wrong_type(name, arr))
}

fn object_values(arr: &dyn Array) -> Result<Vec<Option<ObjectNumber>>, SnapsError> {
    let as_int = |v: i64| {
        u32::try_from(v)
            .map(ObjectNumber::Int)
            .map_err(|_| SnapsError::InvalidValue {
                column: COL_OBJECT.into(),
                value: v.to_string(),
            })
    };
    if let Ok(ints) = i64_values(COL_OBJECT, arr) {
        return ints.into_iter().map(|v| v.map(as_int).transpose()).collect();
    }
    string_values(COL_OBJECT, arr)?
        .into_iter()
        .map(|v| {
            v.map(|s| {
                s.parse::<ObjectNumber>()
                    .map_err(|_| SnapsError::InvalidValue {
                        column: COL_OBJECT.into(),
                        value: s.clone(),
                    })
            })
            .transpose()
        })
        .collect()
}

/// Load observation series from a Parquet file into an existing [`SeriesSet`].
///
/// Arguments
/// -----------------
/// * `set` – destination set; left unchanged when the file fails part-way.
/// * `parquet` – path of the file.
/// * `attributes` – attribute columns to read (named after [`Attribute::name`]).
/// * `batch_size` – optional Arrow reader batch size (default: 2048 rows).
///
/// Return
/// ----------
/// * The number of observations ingested.
/// * `Err(SnapsError::SchemaError)` if a required column is missing or has an unsupported
///   type; I/O and Parquet failures are propagated.
pub(crate) fn parquet_to_series_set(
    set: &mut SeriesSet,
    parquet: &Utf8Path,
    attributes: &[Attribute],
    batch_size: Option<usize>,
) -> Result<usize, SnapsError> {
    let file = std::fs::File::open(parquet)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema_descr = builder.metadata().file_metadata().schema_descr();
    let all_fields = schema_descr.columns();

    let identity = [COL_OBJECT, COL_JD, COL_NIGHT, COL_SOURCE_ID, COL_FID];
    let wanted: Vec<&str> = identity
        .iter()
        .copied()
        .chain(attributes.iter().map(|a| a.name()))
        .collect();
    let projection_indices: Vec<usize> = wanted
        .iter()
        .map(|name| {
            all_fields
                .iter()
                .position(|f| f.name() == *name)
                .ok_or_else(|| {
                    SnapsError::SchemaError(format!("column '{name}' not found in schema"))
                })
        })
        .collect::<Result<_, _>>()?;
    let mask = ProjectionMask::leaves(schema_descr, projection_indices);

    let reader = builder
        .with_projection(mask)
        .with_batch_size(batch_size.unwrap_or(DEFAULT_PARQUET_BATCH))
        .build()?;

    let mut staged = SeriesSet::default();
    let mut ingested = 0usize;
    let mut dropped = 0usize;

    for maybe_batch in reader {
        let batch = maybe_batch.map_err(ParquetError::from)?;

        let objects = object_values(column(&batch, COL_OBJECT)?)?;
        let jd = f64_values(COL_JD, column(&batch, COL_JD)?)?;
        let night = i64_values(COL_NIGHT, column(&batch, COL_NIGHT)?)?;
        let ids = string_values(COL_SOURCE_ID, column(&batch, COL_SOURCE_ID)?)?;
        let fid = i64_values(COL_FID, column(&batch, COL_FID)?)?;
        let values = attributes
            .iter()
            .map(|a| Ok((a, f64_values(a.name(), column(&batch, a.name())?)?)))
            .collect::<Result<Vec<_>, SnapsError>>()?;

        for i in 0..batch.num_rows() {
            let (Some(object), Some(jd), Some(night), Some(id), Some(fid)) = (
                objects[i].as_ref(),
                jd[i],
                night[i],
                ids[i].as_deref(),
                fid[i],
            ) else {
                dropped += 1;
                continue;
            };
            let fid = FilterId::try_from(fid).map_err(|_| SnapsError::InvalidValue {
                column: COL_FID.into(),
                value: fid.to_string(),
            })?;

            let mut obs = Observation::new(jd, night, id, fid);
            for (attr, col) in &values {
                if let Some(v) = col[i] {
                    obs.set_value((*attr).clone(), v);
                }
            }

            staged
                .entry(object.clone())
                .or_insert_with(|| SmallVec::with_capacity(32))
                .push(obs);
            ingested += 1;
        }
    }

    debug!(
        file = %parquet,
        rows = ingested,
        dropped,
        objects = staged.len(),
        "parquet series ingested"
    );
    super::merge_staged(set, staged);
    Ok(ingested)
}
