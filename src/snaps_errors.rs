use thiserror::Error;

use crate::constants::ObjectNumber;

#[derive(Error, Debug)]
pub enum SnapsError {
    #[error("Not enough observations for attribute '{attribute}': {count} available")]
    InsufficientData { attribute: String, count: usize },

    #[error("Degenerate value range for attribute '{attribute}' (zero spread)")]
    DegenerateRange { attribute: String },

    #[error("Range filter on '{column}' with bounds ({low}, {high}) left no rows")]
    EmptyFilterResult {
        column: String,
        low: f64,
        high: f64,
    },

    #[error("Unable to load series for object {object}: {reason}")]
    LoadFailure {
        object: ObjectNumber,
        reason: String,
    },

    #[error("Observation '{source_id}' has no value for attribute '{attribute}'")]
    MissingAttribute {
        attribute: String,
        source_id: String,
    },

    #[error("Observation '{source_id}' has a non-finite value for attribute '{attribute}'")]
    NonFiniteValue {
        attribute: String,
        source_id: String,
    },

    #[error("Invalid scoring parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown table column: {0}")]
    UnknownColumn(String),

    #[error("Operation not allowed in the current run state: {0}")]
    InvalidState(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Input schema error: {0}")]
    SchemaError(String),

    #[error("Invalid value in column '{column}': {value}")]
    InvalidValue { column: String, value: String },
}

impl SnapsError {
    /// Whether the error only neutralises one attribute cell instead of rejecting the row.
    pub fn is_neutralisable(&self) -> bool {
        matches!(
            self,
            SnapsError::InsufficientData { .. } | SnapsError::DegenerateRange { .. }
        )
    }
}

impl PartialEq for SnapsError {
    fn eq(&self, other: &Self) -> bool {
        use SnapsError::*;
        match (self, other) {
            (
                InsufficientData {
                    attribute: a,
                    count: n,
                },
                InsufficientData {
                    attribute: b,
                    count: m,
                },
            ) => a == b && n == m,
            (DegenerateRange { attribute: a }, DegenerateRange { attribute: b }) => a == b,
            (
                EmptyFilterResult {
                    column: c1,
                    low: l1,
                    high: h1,
                },
                EmptyFilterResult {
                    column: c2,
                    low: l2,
                    high: h2,
                },
            ) => c1 == c2 && l1 == l2 && h1 == h2,
            (
                LoadFailure {
                    object: o1,
                    reason: r1,
                },
                LoadFailure {
                    object: o2,
                    reason: r2,
                },
            ) => o1 == o2 && r1 == r2,
            (
                MissingAttribute {
                    attribute: a1,
                    source_id: s1,
                },
                MissingAttribute {
                    attribute: a2,
                    source_id: s2,
                },
            ) => a1 == a2 && s1 == s2,
            (
                NonFiniteValue {
                    attribute: a1,
                    source_id: s1,
                },
                NonFiniteValue {
                    attribute: a2,
                    source_id: s2,
                },
            ) => a1 == a2 && s1 == s2,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (UnknownColumn(a), UnknownColumn(b)) => a == b,
            (InvalidState(a), InvalidState(b)) => a == b,
            (SchemaError(a), SchemaError(b)) => a == b,
            (
                InvalidValue {
                    column: c1,
                    value: v1,
                },
                InvalidValue {
                    column: c2,
                    value: v2,
                },
            ) => c1 == c2 && v1 == v2,

            // Wrapped library errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ParquetError(_), ParquetError(_)) => true,

            _ => false,
        }
    }
}
