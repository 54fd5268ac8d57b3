//! Attribute names and trigger grouping keys.
//!
//! The four survey attributes scored by default are:
//!
//! | Attribute | Column | Source-id column | Meaning |
//! |---|---|---|---|
//! | [`Attribute::Elong`] | `elong` | `ZTF-ELONG` | PSF elongation |
//! | [`Attribute::RealBogus`] | `rb` | `ZTF-RB` | real/bogus classifier score |
//! | [`Attribute::AbsMagnitude`] | `H` | `ZTF-H` | reduced absolute magnitude |
//! | [`Attribute::Mag18oMag8`] | `mag18omag8` | `ZTF-MAG18OMAG8` | 18px / 8px aperture magnitude ratio |
//!
//! Any other column can be scored through [`Attribute::Other`].
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{JulianDate, NightKey};
use crate::snaps_errors::SnapsError;

/// Name of a per-observation scalar attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Attribute {
    Elong,
    RealBogus,
    AbsMagnitude,
    Mag18oMag8,
    Other(String),
}

impl Attribute {
    /// Default attributes of interest, in table column order.
    pub fn defaults() -> Vec<Attribute> {
        vec![
            Attribute::Elong,
            Attribute::RealBogus,
            Attribute::AbsMagnitude,
            Attribute::Mag18oMag8,
        ]
    }

    /// Column name in the survey export.
    pub fn name(&self) -> &str {
        match self {
            Attribute::Elong => "elong",
            Attribute::RealBogus => "rb",
            Attribute::AbsMagnitude => "H",
            Attribute::Mag18oMag8 => "mag18omag8",
            Attribute::Other(name) => name,
        }
    }

    /// Name of the table column holding the triggering source-record identifier.
    pub fn source_column(&self) -> String {
        format!("ZTF-{}", self.name().to_uppercase())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = SnapsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(SnapsError::UnknownColumn("empty attribute name".into())),
            "H" => Ok(Attribute::AbsMagnitude),
            _ => match s.to_ascii_lowercase().as_str() {
                "elong" => Ok(Attribute::Elong),
                "rb" => Ok(Attribute::RealBogus),
                "mag18omag8" => Ok(Attribute::Mag18oMag8),
                _ => Ok(Attribute::Other(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Attribute {
    type Error = SnapsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Attribute> for String {
    fn from(value: Attribute) -> Self {
        value.name().to_string()
    }
}

/// Which observation field identifies the trigger of a sigma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerKey {
    /// Group triggers by observing night.
    #[default]
    Night,
    /// Group triggers by exact observation epoch.
    Epoch,
}

/// Grouping key of a triggering observation.
///
/// Two attributes "co-occur" when their triggering observations share the same key.
/// Epochs are compared bit-for-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Night(NightKey),
    Epoch(u64),
}

impl GroupKey {
    pub fn epoch(jd: JulianDate) -> Self {
        GroupKey::Epoch(jd.to_bits())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Night(n) => write!(f, "night {n}"),
            GroupKey::Epoch(bits) => write!(f, "jd {}", f64::from_bits(*bits)),
        }
    }
}
