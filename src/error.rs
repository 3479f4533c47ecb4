//! Error types for Synheart Motion

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    /// A sequence mixes sample shapes or carries points that are not 2-D.
    #[error("Shape error: {0}")]
    ShapeError(String),

    /// Curve fitting rejected its input (non-finite values, bad positions).
    #[error("Resampling error: {0}")]
    ResamplingError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse session records: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    /// Short machine-readable tag, used for skip tallies and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ComputeError::ShapeError(_) => "shape",
            ComputeError::ResamplingError(_) => "resampling",
            ComputeError::InvalidConfig(_) => "config",
            ComputeError::ParseError(_) => "parse",
            ComputeError::JsonError(_) => "json",
            ComputeError::EncodingError(_) => "encoding",
        }
    }
}
