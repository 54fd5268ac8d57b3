//! Numeric columns of a ranked table.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::observations::Attribute;
use crate::snaps_errors::SnapsError;

pub const COL_NAME: &str = "Name";
pub const COL_ROW_SUM: &str = "Row Sum";
pub const COL_ABS_ROW_SUM: &str = "Abs Row Sum";
pub const COL_RATING: &str = "Rating";

/// A numeric column that can be summarised, sorted or range-filtered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Sigma(Attribute),
    RowSum,
    AbsRowSum,
    Rating,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Sigma(a) => write!(f, "{a}"),
            Column::RowSum => f.write_str(COL_ROW_SUM),
            Column::AbsRowSum => f.write_str(COL_ABS_ROW_SUM),
            Column::Rating => f.write_str(COL_RATING),
        }
    }
}

impl FromStr for Column {
    type Err = SnapsError;

    /// Accepts the table header names (`"Row Sum"`, `"Abs Row Sum"`, `"Rating"`), their
    /// snake/camel spellings, and attribute names. Source-id columns are not numeric.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "rowsum" => Ok(Column::RowSum),
            "absrowsum" => Ok(Column::AbsRowSum),
            "rating" => Ok(Column::Rating),
            _ if s.trim().to_ascii_uppercase().starts_with("ZTF-") => {
                Err(SnapsError::UnknownColumn(format!("'{}' is not numeric", s.trim())))
            }
            _ => s.parse::<Attribute>().map(Column::Sigma),
        }
    }
}

#[cfg(test)]
mod column_tests {
    use super::*;

    #[test]
    fn parse_header_names() {
        assert_eq!("Row Sum".parse::<Column>().unwrap(), Column::RowSum);
        assert_eq!("abs_row_sum".parse::<Column>().unwrap(), Column::AbsRowSum);
        assert_eq!("Rating".parse::<Column>().unwrap(), Column::Rating);
        assert_eq!(
            "rb".parse::<Column>().unwrap(),
            Column::Sigma(Attribute::RealBogus)
        );
        assert!(matches!(
            "ZTF-RB".parse::<Column>(),
            Err(SnapsError::UnknownColumn(_))
        ));
        assert!("".parse::<Column>().is_err());
    }

    #[test]
    fn display_matches_header() {
        assert_eq!(Column::AbsRowSum.to_string(), "Abs Row Sum");
        assert_eq!(Column::Sigma(Attribute::AbsMagnitude).to_string(), "H");
    }
}
