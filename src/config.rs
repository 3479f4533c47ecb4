//! Averaging configuration
//!
//! The two tunables of the resampling engine, passed explicitly into every
//! averaging run so that runs with different settings never interfere.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of samples in every resampled sequence
pub const DEFAULT_TARGET_LEN: usize = 100;

/// Default minimum sample count for smooth (cubic) fitting
pub const DEFAULT_SMOOTH_MIN_SAMPLES: usize = 4;

/// Fewest knots a not-a-knot cubic spline can be built from
pub const MIN_SMOOTH_SAMPLES: usize = 4;

/// Configuration for a resampling and averaging run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AveragingConfig {
    /// Length N of every resampled sequence
    pub target_len: usize,
    /// Sequences with at least this many samples are fit with a cubic spline;
    /// shorter ones fall back to piecewise-linear interpolation
    pub smooth_min_samples: usize,
}

impl Default for AveragingConfig {
    fn default() -> Self {
        Self {
            target_len: DEFAULT_TARGET_LEN,
            smooth_min_samples: DEFAULT_SMOOTH_MIN_SAMPLES,
        }
    }
}

impl AveragingConfig {
    pub fn with_target_len(mut self, target_len: usize) -> Self {
        self.target_len = target_len;
        self
    }

    pub fn with_smooth_min_samples(mut self, smooth_min_samples: usize) -> Self {
        self.smooth_min_samples = smooth_min_samples;
        self
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.target_len < 1 {
            return Err(ComputeError::InvalidConfig(
                "target_len must be at least 1".to_string(),
            ));
        }
        if self.smooth_min_samples < MIN_SMOOTH_SAMPLES {
            return Err(ComputeError::InvalidConfig(format!(
                "smooth_min_samples must be at least {}, got {}",
                MIN_SMOOTH_SAMPLES, self.smooth_min_samples
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ComputeError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ComputeError> {
        let content = self.to_json()?;
        fs::write(path, content).map_err(|e| {
            ComputeError::EncodingError(format!("cannot write {}: {}", path.display(), e))
        })
    }
}
