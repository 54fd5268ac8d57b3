//! # Photometric observations
//!
//! An [`Observation`] is one survey detection of an asteroid: its epoch, the night it
//! belongs to, the identifier of the source record (alert candidate), the image filter,
//! and a small map of per-detection attribute values (elongation, real/bogus score,
//! absolute magnitude, magnitude ratio, ...).
//!
//! ## Overview
//! -----------------
//! * [`Observation`] – one detection, attribute values stored inline.
//! * [`attribute`] – [`Attribute`] names, trigger grouping keys.
//! * [`series_ext`] – helpers on a whole object series (value extraction, time ordering).
//! * [`display`] – tabular rendering of a series.
//!
//! Observations are only ever compared with observations of the **same object**;
//! nothing in this module mixes series.
pub mod attribute;
pub mod display;
pub mod series_ext;

pub use attribute::{Attribute, GroupKey, TriggerKey};

use smallvec::SmallVec;

use crate::constants::{FilterId, JulianDate, NightKey};
use crate::snaps_errors::SnapsError;

/// One photometric detection of an object.
///
/// Fields
/// -----------------
/// * `jd` – observation epoch (Julian date).
/// * `night` – integer key of the observing night.
/// * `source_id` – identifier of the source record, reported as the trigger of a sigma.
/// * `fid` – image filter identifier.
///
/// Attribute values are accessed through [`Observation::value`] and
/// [`Observation::require_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub jd: JulianDate,
    pub night: NightKey,
    pub source_id: String,
    pub fid: FilterId,
    values: SmallVec<[(Attribute, f64); 4]>,
}

impl Observation {
    /// Create an observation without attribute values.
    pub fn new(jd: JulianDate, night: NightKey, source_id: impl Into<String>, fid: FilterId) -> Self {
        Observation {
            jd,
            night,
            source_id: source_id.into(),
            fid,
            values: SmallVec::new(),
        }
    }

    /// Builder-style variant of [`Observation::set_value`].
    pub fn with_value(mut self, attribute: Attribute, value: f64) -> Self {
        self.set_value(attribute, value);
        self
    }

    /// Set the value of `attribute`, replacing any previous value.
    pub fn set_value(&mut self, attribute: Attribute, value: f64) {
        match self.values.iter_mut().find(|(a, _)| *a == attribute) {
            Some(slot) => slot.1 = value,
            None => self.values.push((attribute, value)),
        }
    }

    /// Raw value of `attribute`, if the observation carries one.
    pub fn value(&self, attribute: &Attribute) -> Option<f64> {
        self.values
            .iter()
            .find(|(a, _)| a == attribute)
            .map(|(_, v)| *v)
    }

    /// Value of `attribute`, required to be present and finite.
    ///
    /// Return
    /// ----------
    /// * `Ok(v)` – the finite value.
    /// * `Err(SnapsError::MissingAttribute)` – the attribute is absent.
    /// * `Err(SnapsError::NonFiniteValue)` – the value is NaN or infinite.
    pub fn require_value(&self, attribute: &Attribute) -> Result<f64, SnapsError> {
        match self.value(attribute) {
            None => Err(SnapsError::MissingAttribute {
                attribute: attribute.to_string(),
                source_id: self.source_id.clone(),
            }),
            Some(v) if !v.is_finite() => Err(SnapsError::NonFiniteValue {
                attribute: attribute.to_string(),
                source_id: self.source_id.clone(),
            }),
            Some(v) => Ok(v),
        }
    }

    /// Attributes this observation carries a value for, in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.values.iter().map(|(a, _)| a)
    }

    /// Grouping key used to compare triggering observations.
    pub fn group_key(&self, mode: TriggerKey) -> GroupKey {
        match mode {
            TriggerKey::Night => GroupKey::Night(self.night),
            TriggerKey::Epoch => GroupKey::epoch(self.jd),
        }
    }
}
