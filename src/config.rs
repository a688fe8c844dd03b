//! Configuration for the measurement pipeline.
//!
//! All tunable constants live here: reference height, base unit, quality and
//! visibility thresholds, scale sanity limits and the plausibility bounds.
//! Values are loaded from TOML and may be overridden from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::measurement::Unit;
use crate::validate::{Range, RangeTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Assumed subject height, in inches.
    pub reference_height: f32,
    /// Unit of every produced measurement.
    pub base_unit: Unit,
    /// Poses scoring below this overall quality are rejected.
    pub quality_threshold: f32,
    /// Landmarks below this visibility are unusable as anchors.
    pub visibility_threshold: f32,
    /// Minimum head-to-foot span, as a fraction of image height, for a measured scale.
    pub min_person_fraction: f32,
    /// Accepted interval for a measured scale factor, in inches per pixel.
    pub scale_range: Range,
    /// Wrist circumference reported when a wrist is visible, in inches.
    pub wrist_estimate: f32,
    /// Plausibility bounds, in inches.
    pub bounds: RangeTable,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            reference_height: 68.0,
            base_unit: Unit::Inches,
            quality_threshold: 0.6,
            visibility_threshold: 0.5,
            min_person_fraction: 0.3,
            scale_range: Range::new(0.01, 1.0),
            wrist_estimate: 6.5,
            bounds: RangeTable::default(),
        }
    }
}

impl MeasurementConfig {
    pub const ENV_REFERENCE_HEIGHT: &'static str = "TAILOR_REFERENCE_HEIGHT";
    pub const ENV_BASE_UNIT: &'static str = "TAILOR_BASE_UNIT";
    pub const ENV_QUALITY_THRESHOLD: &'static str = "TAILOR_QUALITY_THRESHOLD";
    pub const ENV_VISIBILITY_THRESHOLD: &'static str = "TAILOR_VISIBILITY_THRESHOLD";

    /// Load configuration from a TOML file, falling back to defaults if it does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: MeasurementConfig = toml::from_str(&contents)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration as pretty TOML, creating parent directories as needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("tailor-measure.toml")
    }

    /// Apply `TAILOR_*` environment overrides. Unparsable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, Self::ENV_REFERENCE_HEIGHT) {
            self.reference_height = v;
        }
        if let Some(v) = parse_override(&lookup, Self::ENV_BASE_UNIT) {
            self.base_unit = v;
        }
        if let Some(v) = parse_override(&lookup, Self::ENV_QUALITY_THRESHOLD) {
            self.quality_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, Self::ENV_VISIBILITY_THRESHOLD) {
            self.visibility_threshold = v;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !(self.reference_height.is_finite() && self.reference_height > 0.0) {
            return Err(Error::InvalidConfig(
                "reference_height must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(Error::InvalidConfig(
                "quality_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(Error::InvalidConfig(
                "visibility_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_person_fraction) {
            return Err(Error::InvalidConfig(
                "min_person_fraction must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !self.scale_range.is_valid() || self.scale_range.min <= 0.0 {
            return Err(Error::InvalidConfig(
                "scale_range must be a positive, non-empty interval".to_string(),
            ));
        }
        if !(self.wrist_estimate.is_finite() && self.wrist_estimate > 0.0) {
            return Err(Error::InvalidConfig(
                "wrist_estimate must be positive".to_string(),
            ));
        }
        if let Some((kind, _)) = self.bounds.iter().find(|(_, r)| !r.is_valid()) {
            return Err(Error::InvalidConfig(format!(
                "bounds for {} must satisfy min <= max",
                kind
            )));
        }
        Ok(())
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => {
            log::debug!("{} overridden from environment", key);
            Some(v)
        }
        Err(_) => {
            log::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}
