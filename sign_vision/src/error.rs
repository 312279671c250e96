use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between opening the model and drawing a frame.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("label table not found at {0}")]
    LabelsNotFound(PathBuf),

    #[error("label table {path} is malformed: {reason}")]
    LabelsMalformed { path: PathBuf, reason: String },

    #[error("could not open capture device: {0}")]
    DeviceUnavailable(String),

    #[error("frame acquisition failed: {0}")]
    Acquisition(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("classifier returned no usable scores")]
    EmptyScores,

    #[error("display error: {0}")]
    Display(String),
}

pub type Result<T> = std::result::Result<T, VisionError>;
