//! Kinematic derivation
//!
//! Derives jerk (first difference of acceleration) from the averaged
//! acceleration sequence, plus a scale-normalized variant.

use serde::{Deserialize, Serialize};

/// Jerk values smaller than this in magnitude are snapped to exact zero
pub const JERK_ZERO_EPSILON: f64 = 1e-10;

/// Jerk sequences derived from one averaged acceleration sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JerkProfile {
    /// `acceleration[i + 1] - acceleration[i]`, length N - 1
    pub jerks: Vec<f64>,
    /// `jerks / mean(|jerks|)`, or `jerks` unchanged when that mean is zero
    pub jerks_normalized: Vec<f64>,
}

/// Deriver for jerk sequences
pub struct KinematicDeriver;

impl KinematicDeriver {
    /// Derive jerk from averaged accelerations.
    ///
    /// Returns `None` for an empty acceleration sequence so callers omit the
    /// jerk fields instead of emitting empty ones.
    pub fn derive(accelerations: &[f64]) -> Option<JerkProfile> {
        if accelerations.is_empty() {
            return None;
        }
        let jerks = compute_jerks(accelerations);
        let jerks_normalized = normalize_jerks(&jerks);
        Some(JerkProfile {
            jerks,
            jerks_normalized,
        })
    }
}

/// First difference with near-zero values snapped to zero
pub fn compute_jerks(accelerations: &[f64]) -> Vec<f64> {
    accelerations
        .windows(2)
        .map(|pair| {
            let jerk = pair[1] - pair[0];
            if jerk.abs() < JERK_ZERO_EPSILON {
                0.0
            } else {
                jerk
            }
        })
        .collect()
}

/// Divide by the mean absolute jerk. A zero mean returns the input as-is.
pub fn normalize_jerks(jerks: &[f64]) -> Vec<f64> {
    let mean_abs = mean_abs(jerks);
    if mean_abs == 0.0 {
        return jerks.to_vec();
    }
    jerks.iter().map(|j| j / mean_abs).collect()
}

pub(crate) fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}
