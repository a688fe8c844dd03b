use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Pose unusable (quality {overall:.2}): {reason}; \
         retake photo, ensure subject fully visible and upright"
    )]
    PoseUnusable { overall: f32, reason: String },

    #[error("Pipeline fault during {stage}: {reason}")]
    PipelineFault { stage: Stage, reason: String },

    #[error("Invalid landmarks: {0}")]
    InvalidLandmarks(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn fault(stage: Stage, reason: impl Into<String>) -> Self {
        Error::PipelineFault {
            stage,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
