//! Quick overviews of one or many measurement sets.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::measurement::{Measurement, MeasurementKind, MeasurementSet, Unit};

/// Measurements shown first on fitting sheets.
pub const KEY_MEASUREMENTS: [MeasurementKind; 6] = [
    MeasurementKind::Chest,
    MeasurementKind::Waist,
    MeasurementKind::Hips,
    MeasurementKind::Shoulders,
    MeasurementKind::ArmLength,
    MeasurementKind::Inseam,
];

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementSummary {
    pub total_measurements: usize,
    pub key_measurements: BTreeMap<String, String>,
    pub confidence: String,
}

impl MeasurementSummary {
    pub fn from_set(set: &MeasurementSet) -> Self {
        let key_measurements = KEY_MEASUREMENTS
            .iter()
            .filter_map(|kind| set.get(*kind).map(|m| (kind.key().to_string(), m.to_string())))
            .collect();
        Self {
            total_measurements: set.len(),
            key_measurements,
            confidence: set.confidence_label(),
        }
    }
}

/// Aggregate statistics over many measurement sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementStats {
    pub total_count: usize,
    /// How many sets contain each measurement.
    pub common_measurements: BTreeMap<String, usize>,
    pub average_confidence: f32,
    /// Mean value per measurement, in inches.
    pub average_inches: BTreeMap<String, f32>,
}

impl MeasurementStats {
    pub fn from_sets<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a MeasurementSet>,
    {
        let mut stats = Self::default();
        let mut confidence_total = 0.0f32;
        let mut sums: BTreeMap<MeasurementKind, (f32, usize)> = BTreeMap::new();

        for set in sets {
            stats.total_count += 1;
            confidence_total += set.confidence();
            for (kind, m) in set.iter() {
                *stats.common_measurements.entry(kind.key().to_string()).or_default() += 1;
                let inches = m.to_unit(Unit::Inches).value;
                let entry = sums.entry(kind).or_insert((0.0, 0));
                entry.0 += inches;
                entry.1 += 1;
            }
        }

        if stats.total_count > 0 {
            stats.average_confidence = confidence_total / stats.total_count as f32;
        }
        stats.average_inches = sums
            .into_iter()
            .map(|(kind, (sum, n))| (kind.key().to_string(), sum / n as f32))
            .collect();
        stats
    }

    /// Average value of one measurement across the sets that contain it.
    pub fn average(&self, kind: MeasurementKind) -> Option<Measurement> {
        self.average_inches
            .get(kind.key())
            .map(|v| Measurement::new(*v, Unit::Inches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[(MeasurementKind, f32, Unit)], confidence: f32) -> MeasurementSet {
        let mut set = MeasurementSet::new();
        for (kind, value, unit) in values {
            set.insert(*kind, Measurement::new(*value, *unit));
        }
        set.set_confidence(confidence);
        set
    }

    #[test]
    fn summary_lists_key_measurements_only() {
        let s = set(
            &[
                (MeasurementKind::Chest, 40.0, Unit::Inches),
                (MeasurementKind::Neck, 15.0, Unit::Inches),
                (MeasurementKind::Inseam, 31.0, Unit::Inches),
            ],
            77.0,
        );
        let summary = MeasurementSummary::from_set(&s);
        assert_eq!(summary.total_measurements, 3);
        assert_eq!(summary.key_measurements.len(), 2);
        assert_eq!(summary.key_measurements["chest"], "40.0 inches");
        assert_eq!(summary.confidence, "77%");
    }

    #[test]
    fn stats_over_mixed_units() {
        let a = set(&[(MeasurementKind::Chest, 40.0, Unit::Inches)], 80.0);
        let b = set(
            &[
                (MeasurementKind::Chest, 101.6, Unit::Cm),
                (MeasurementKind::Hips, 42.0, Unit::Inches),
            ],
            60.0,
        );
        let stats = MeasurementStats::from_sets([&a, &b]);
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.common_measurements["chest"], 2);
        assert_eq!(stats.common_measurements["hips"], 1);
        assert!((stats.average_confidence - 70.0).abs() < 1e-4);
        assert!((stats.average(MeasurementKind::Chest).unwrap().value - 40.0).abs() < 1e-3);
        assert!(stats.average(MeasurementKind::Neck).is_none());
    }

    #[test]
    fn stats_of_nothing_is_empty() {
        let stats = MeasurementStats::from_sets(std::iter::empty());
        assert_eq!(stats, MeasurementStats::default());
    }
}
