//! # Constants and type definitions for SNAPS
//!
//! This module centralizes the **default attribute set**, the **column names** expected by
//! the ingestion readers, and the **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - Scalar type aliases (Julian dates, night keys, sigma values, ratings)
//! - Identifiers for asteroids ([`ObjectNumber`])
//! - Container types for observation series ([`ObjectSeries`], [`SeriesSet`])
//! - Column names of the survey export format
//!
//! These definitions are shared by the scorers, the filter engine and the table builder.

use crate::observations::Observation;
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Numerical constants
// -------------------------------------------------------------------------------------------------

/// Upper bound of the anomaly rating scale.
pub const RATING_SCALE: f64 = 100.0;

/// Number of sorted values averaged on each side when extremes are smoothed.
pub const SMOOTHING_WIDTH: usize = 3;

/// Conversion offset between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Default batch size used by the Parquet reader.
pub const DEFAULT_PARQUET_BATCH: usize = 2048;

// -------------------------------------------------------------------------------------------------
// Column names of the survey export
// -------------------------------------------------------------------------------------------------

/// Object designation column.
pub const COL_OBJECT: &str = "ssnamenr";
/// Observation epoch column (Julian date).
pub const COL_JD: &str = "jd";
/// Night grouping column.
pub const COL_NIGHT: &str = "night";
/// Source record (alert candidate) identifier column.
pub const COL_SOURCE_ID: &str = "id";
/// Image filter identifier column.
pub const COL_FID: &str = "fid";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Observation epoch as a Julian date (days)
pub type JulianDate = f64;
/// Integer key grouping observations taken during the same night
pub type NightKey = i64;
/// Image filter identifier (1 = g, 2 = r, 3 = i for ZTF)
pub type FilterId = u8;
/// Signed, weighted number of standard deviations
pub type Sigma = f64;
/// Anomaly rating on the `[0, 100]` scale
pub type Rating = f64;

// -------------------------------------------------------------------------------------------------
// Identifiers and data containers
// -------------------------------------------------------------------------------------------------

/// Identifier of a solar system object.
///
/// This can be:
/// - An asteroid number (e.g. `Int(1234)`)
/// - A provisional or string designation (e.g. `"2015AB"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectNumber {
    /// Integer-based MPC designation (e.g. 1, 433…)
    Int(u32),
    /// String-based designation (provisional, survey name, etc.)
    String(String),
}

impl std::fmt::Display for ObjectNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectNumber::Int(n) => write!(f, "{n}"),
            ObjectNumber::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for ObjectNumber {
    fn from(n: u32) -> Self {
        ObjectNumber::Int(n)
    }
}

impl From<String> for ObjectNumber {
    fn from(s: String) -> Self {
        ObjectNumber::String(s)
    }
}

impl From<&str> for ObjectNumber {
    fn from(s: &str) -> Self {
        ObjectNumber::String(s.to_string())
    }
}

impl std::str::FromStr for ObjectNumber {
    type Err = std::num::ParseIntError;

    /// Parse an `ObjectNumber` from a designation string.
    /// - Pure digits that fit a `u32` → `Int(u32)`
    /// - Anything containing a non-digit → `String(String)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<u32>() {
            Ok(n) => Ok(ObjectNumber::Int(n)),
            Err(e) => {
                if s.is_empty() || s.chars().all(|c| c.is_ascii_digit()) {
                    Err(e)
                } else {
                    Ok(ObjectNumber::String(s.to_string()))
                }
            }
        }
    }
}

/// Time-ordered observations of a single object, inline-optimized for short series.
pub type ObjectSeries = SmallVec<[Observation; 8]>;

/// All loaded series, keyed by object identifier.
pub type SeriesSet = HashMap<ObjectNumber, ObjectSeries, RandomState>;

#[cfg(test)]
mod test_constants {
    use super::*;

    #[test]
    fn test_object_number_parsing() {
        assert_eq!("433".parse::<ObjectNumber>().unwrap(), ObjectNumber::Int(433));
        assert_eq!(
            "2015AB".parse::<ObjectNumber>().unwrap(),
            ObjectNumber::String("2015AB".into())
        );
        assert_eq!(" 12 ".parse::<ObjectNumber>().unwrap(), ObjectNumber::Int(12));
        assert!("".parse::<ObjectNumber>().is_err());
        assert!("99999999999".parse::<ObjectNumber>().is_err());
    }

    #[test]
    fn test_object_number_ordering() {
        let mut ids = vec![
            ObjectNumber::from("2015AB"),
            ObjectNumber::from(12u32),
            ObjectNumber::from(3u32),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ObjectNumber::Int(3),
                ObjectNumber::Int(12),
                ObjectNumber::String("2015AB".into())
            ]
        );
    }
}
