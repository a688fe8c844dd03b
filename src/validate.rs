//! Plausibility bounds for estimated measurements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::measurement::{Measurement, MeasurementKind, MeasurementSet, Unit};

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Pull `value` onto the nearer bound when it lies outside.
    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub(crate) fn to_unit(self, from: Unit, to: Unit) -> Self {
        Self::new(from.convert(self.min, to), from.convert(self.max, to))
    }
}

/// Plausible human-body bounds per measurement, in inches.
///
/// Deserialized tables are merged onto the defaults, so a config file only
/// needs to list the bounds it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Range>", into = "BTreeMap<String, Range>")]
pub struct RangeTable {
    bounds: BTreeMap<MeasurementKind, Range>,
}

impl Default for RangeTable {
    fn default() -> Self {
        use MeasurementKind::*;
        let bounds = [
            (Chest, Range::new(28.0, 60.0)),
            (Waist, Range::new(24.0, 50.0)),
            (Hips, Range::new(30.0, 55.0)),
            (Shoulders, Range::new(14.0, 26.0)),
            (ArmLength, Range::new(20.0, 35.0)),
            (Inseam, Range::new(26.0, 38.0)),
            (Neck, Range::new(12.0, 20.0)),
            (Bicep, Range::new(8.0, 20.0)),
            (Thigh, Range::new(16.0, 30.0)),
            (Wrist, Range::new(5.0, 9.0)),
        ];
        Self {
            bounds: bounds.into_iter().collect(),
        }
    }
}

impl RangeTable {
    pub fn get(&self, kind: MeasurementKind) -> Option<Range> {
        self.bounds.get(&kind).copied()
    }

    pub fn set(&mut self, kind: MeasurementKind, range: Range) {
        self.bounds.insert(kind, range);
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementKind, Range)> + '_ {
        self.bounds.iter().map(|(kind, range)| (*kind, *range))
    }
}

impl TryFrom<BTreeMap<String, Range>> for RangeTable {
    type Error = Error;

    fn try_from(map: BTreeMap<String, Range>) -> Result<Self> {
        let mut table = RangeTable::default();
        for (key, range) in map {
            let kind = MeasurementKind::from_key(&key).ok_or_else(|| {
                Error::InvalidConfig(format!("unknown measurement '{}' in bounds", key))
            })?;
            table.set(kind, range);
        }
        Ok(table)
    }
}

impl From<RangeTable> for BTreeMap<String, Range> {
    fn from(table: RangeTable) -> Self {
        table
            .bounds
            .into_iter()
            .map(|(kind, range)| (kind.key().to_string(), range))
            .collect()
    }
}

/// Clamps estimated values onto their plausible bounds.
#[derive(Debug, Clone, Default)]
pub struct RangeValidator {
    bounds: RangeTable,
}

impl RangeValidator {
    pub fn new(bounds: RangeTable) -> Self {
        Self { bounds }
    }

    /// Bounds for `kind` expressed in `unit`.
    pub fn bounds(&self, kind: MeasurementKind, unit: Unit) -> Option<Range> {
        self.bounds.get(kind).map(|r| r.to_unit(Unit::Inches, unit))
    }

    pub fn clamp(&self, kind: MeasurementKind, measurement: Measurement) -> Measurement {
        match self.bounds(kind, measurement.unit) {
            Some(range) if !range.contains(measurement.value) => {
                let clamped = range.clamp(measurement.value);
                log::debug!(
                    "Clamped {} from {:.2} to {:.2} {}",
                    kind,
                    measurement.value,
                    clamped,
                    measurement.unit
                );
                Measurement::new(clamped, measurement.unit)
            }
            _ => measurement,
        }
    }

    /// Clamp every present measurement; absent ones stay absent.
    pub fn validate(&self, set: &MeasurementSet) -> MeasurementSet {
        let mut validated = set.clone();
        for (kind, m) in set.iter() {
            validated.insert(kind, self.clamp(kind, m));
        }
        validated
    }
}
