//! Measurement kinds, units and the measurement set produced by one pipeline run.
//!
//! A [`MeasurementSet`] is a fixed-schema record: every [`MeasurementKind`] has
//! a slot that is either present or absent. Absent measurements are missing
//! keys in the formatted output, never zero or null.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

/// Centimetres per inch.
pub const CM_PER_INCH: f32 = 2.54;

/// Key used for the confidence entry in formatted output.
pub const CONFIDENCE_KEY: &str = "confidence";

/// Lower bound of the reported confidence, in percent.
pub const MIN_CONFIDENCE: f32 = 50.0;

/// Upper bound of the reported confidence, in percent.
pub const MAX_CONFIDENCE: f32 = 95.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementKind {
    Chest,
    Waist,
    Hips,
    Shoulders,
    ArmLength,
    Inseam,
    Neck,
    Bicep,
    Thigh,
    Wrist,
}

impl MeasurementKind {
    pub const COUNT: usize = 10;

    /// All kinds in canonical output order.
    pub const ALL: [MeasurementKind; Self::COUNT] = [
        MeasurementKind::Chest,
        MeasurementKind::Waist,
        MeasurementKind::Hips,
        MeasurementKind::Shoulders,
        MeasurementKind::ArmLength,
        MeasurementKind::Inseam,
        MeasurementKind::Neck,
        MeasurementKind::Bicep,
        MeasurementKind::Thigh,
        MeasurementKind::Wrist,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            MeasurementKind::Chest => "chest",
            MeasurementKind::Waist => "waist",
            MeasurementKind::Hips => "hips",
            MeasurementKind::Shoulders => "shoulders",
            MeasurementKind::ArmLength => "armLength",
            MeasurementKind::Inseam => "inseam",
            MeasurementKind::Neck => "neck",
            MeasurementKind::Bicep => "bicep",
            MeasurementKind::Thigh => "thigh",
            MeasurementKind::Wrist => "wrist",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Whether the value comes from landmark geometry rather than a fixed constant.
    pub const fn is_geometric(self) -> bool {
        !matches!(self, MeasurementKind::Wrist)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Inches,
    Cm,
}

impl Unit {
    pub const fn label(self) -> &'static str {
        match self {
            Unit::Inches => "inches",
            Unit::Cm => "cm",
        }
    }

    /// Convert a value expressed in `self` into `target`.
    pub fn convert(self, value: f32, target: Unit) -> f32 {
        match (self, target) {
            (Unit::Inches, Unit::Cm) => value * CM_PER_INCH,
            (Unit::Cm, Unit::Inches) => value / CM_PER_INCH,
            _ => value,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(Unit::Inches),
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Ok(Unit::Cm),
            other => Err(Error::InvalidMeasurement(format!("unknown unit '{}'", other))),
        }
    }
}

/// A single physical-unit value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f32,
    pub unit: Unit,
}

impl Measurement {
    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn to_unit(self, target: Unit) -> Self {
        Self::new(self.unit.convert(self.value, target), target)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.value, self.unit)
    }
}

impl FromStr for Measurement {
    type Err = Error;

    /// Parse `"<number> <unit>"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(number), Some(unit)) = (parts.next(), parts.next()) else {
            return Err(Error::InvalidMeasurement(format!(
                "expected '<number> <unit>', got '{}'",
                s
            )));
        };
        let value: f32 = number
            .parse()
            .map_err(|_| Error::InvalidMeasurement(format!("bad number in '{}'", s)))?;
        if !value.is_finite() {
            return Err(Error::InvalidMeasurement(format!("non-finite value in '{}'", s)));
        }
        Ok(Self::new(value, unit.parse()?))
    }
}

/// Measurements estimated from one landmark set, plus an overall confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSet {
    values: [Option<Measurement>; MeasurementKind::COUNT],
    confidence: f32,
}

impl Default for MeasurementSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSet {
    /// An empty set with confidence at its floor.
    pub fn new() -> Self {
        Self {
            values: [None; MeasurementKind::COUNT],
            confidence: MIN_CONFIDENCE,
        }
    }

    pub fn get(&self, kind: MeasurementKind) -> Option<Measurement> {
        self.values[kind.slot()]
    }

    pub fn value(&self, kind: MeasurementKind) -> Option<f32> {
        self.get(kind).map(|m| m.value)
    }

    pub fn contains(&self, kind: MeasurementKind) -> bool {
        self.values[kind.slot()].is_some()
    }

    pub fn insert(&mut self, kind: MeasurementKind, measurement: Measurement) {
        self.values[kind.slot()] = Some(measurement);
    }

    /// Confidence in percent, always within [50, 95] once scored.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence;
    }

    /// Present measurements in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MeasurementKind, Measurement)> + '_ {
        MeasurementKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|m| (kind, m)))
    }

    pub fn len(&self) -> usize {
        self.values.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of present measurements derived from landmark geometry.
    pub fn geometric_count(&self) -> usize {
        self.iter().filter(|(kind, _)| kind.is_geometric()).count()
    }

    /// Convert every measurement to `target`; confidence is untouched.
    pub fn convert_to(&self, target: Unit) -> Self {
        let mut converted = self.clone();
        for slot in converted.values.iter_mut().flatten() {
            *slot = slot.to_unit(target);
        }
        converted
    }

    /// Confidence formatted as `"<integer>%"`.
    pub fn confidence_label(&self) -> String {
        format!("{:.0}%", self.confidence)
    }

    /// Output contract form: measurement key to `"<value> <unit>"`, plus confidence.
    pub fn to_formatted(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = self
            .iter()
            .map(|(kind, m)| (kind.key().to_string(), m.to_string()))
            .collect();
        map.insert(CONFIDENCE_KEY.to_string(), self.confidence_label());
        map
    }

    /// Rebuild a set from its formatted form. Unknown keys are rejected.
    pub fn from_formatted(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut set = Self::new();
        for (key, value) in map {
            if key == CONFIDENCE_KEY {
                set.confidence = parse_confidence(value)?;
                continue;
            }
            let kind = MeasurementKind::from_key(key).ok_or_else(|| {
                Error::InvalidMeasurement(format!("unknown measurement '{}'", key))
            })?;
            set.insert(kind, value.parse()?);
        }
        Ok(set)
    }
}

fn parse_confidence(value: &str) -> Result<f32> {
    let bad = || Error::InvalidMeasurement(format!("bad confidence '{}'", value));
    let confidence: f32 = value
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| bad())?;
    if !confidence.is_finite() {
        return Err(bad());
    }
    Ok(confidence)
}

/// Convert a formatted measurement map to `target`.
///
/// Entries that do not parse as `"<number> <unit>"` and the confidence entry
/// pass through unchanged.
pub fn convert_formatted(map: &BTreeMap<String, String>, target: Unit) -> BTreeMap<String, String> {
    map.iter()
        .map(|(key, value)| {
            let converted = if key == CONFIDENCE_KEY {
                value.clone()
            } else {
                match value.parse::<Measurement>() {
                    Ok(m) => m.to_unit(target).to_string(),
                    Err(e) => {
                        log::debug!("Leaving '{}' unconverted: {}", key, e);
                        value.clone()
                    }
                }
            };
            (key.clone(), converted)
        })
        .collect()
}

impl Serialize for MeasurementSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len() + 1))?;
        for (kind, m) in self.iter() {
            map.serialize_entry(kind.key(), &m.to_string())?;
        }
        map.serialize_entry(CONFIDENCE_KEY, &self.confidence_label())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for MeasurementSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = BTreeMap::<String, String>::deserialize(deserializer)?;
        MeasurementSet::from_formatted(&map).map_err(serde::de::Error::custom)
    }
}
